//! Row mapping shared by the entry repository and the search provider.

use std::collections::HashMap;

use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use brainshelf_core::{Entry, EntryFull, EntryType, Error, Metadata, Result};

/// Entry columns plus project name and prefixed metadata columns.
pub(crate) const ENTRY_FULL_COLUMNS: &str = r#"
    e.id, e.project_id, e.title, e.description, e.entry_type, e.content, e.url,
    e.created_at, e.updated_at,
    p.name AS project_name,
    m.id AS m_id, m.title AS m_title, m.description AS m_description,
    m.keywords AS m_keywords, m.image_url AS m_image_url,
    m.favicon_url AS m_favicon_url, m.author AS m_author,
    m.site_name AS m_site_name, m.created_at AS m_created_at,
    m.updated_at AS m_updated_at
"#;

pub(crate) const ENTRY_FULL_JOINS: &str = r#"
    FROM entry e
    JOIN project p ON p.id = e.project_id
    LEFT JOIN metadata m ON m.entry_id = e.id
"#;

pub(crate) fn parse_entry_type(raw: &str) -> Result<EntryType> {
    raw.parse::<EntryType>()
        .map_err(|_| Error::Internal(format!("Unknown entry_type '{}' in store", raw)))
}

pub(crate) fn entry_from_row(row: &PgRow) -> Result<Entry> {
    let entry_type: String = row.get("entry_type");
    Ok(Entry {
        id: row.get("id"),
        project_id: row.get("project_id"),
        title: row.get("title"),
        description: row.get("description"),
        entry_type: parse_entry_type(&entry_type)?,
        content: row.get("content"),
        url: row.get("url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

pub(crate) fn metadata_from_row(row: &PgRow) -> Metadata {
    Metadata {
        id: row.get("id"),
        entry_id: row.get("entry_id"),
        title: row.get("title"),
        description: row.get("description"),
        keywords: row.get("keywords"),
        image_url: row.get("image_url"),
        favicon_url: row.get("favicon_url"),
        author: row.get("author"),
        site_name: row.get("site_name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Metadata from the `m_`-prefixed columns of [`ENTRY_FULL_COLUMNS`].
fn joined_metadata_from_row(row: &PgRow, entry_id: Uuid) -> Option<Metadata> {
    let id: Option<Uuid> = row.get("m_id");
    id.map(|id| Metadata {
        id,
        entry_id,
        title: row.get("m_title"),
        description: row.get("m_description"),
        keywords: row.get("m_keywords"),
        image_url: row.get("m_image_url"),
        favicon_url: row.get("m_favicon_url"),
        author: row.get("m_author"),
        site_name: row.get("m_site_name"),
        created_at: row.get("m_created_at"),
        updated_at: row.get("m_updated_at"),
    })
}

/// Map rows selected with [`ENTRY_FULL_COLUMNS`], attaching tags in one query.
pub(crate) async fn entries_full_from_rows(
    pool: &Pool<Postgres>,
    rows: Vec<PgRow>,
) -> Result<Vec<EntryFull>> {
    let mut entries = Vec::with_capacity(rows.len());
    for row in &rows {
        let entry = entry_from_row(row)?;
        let metadata = joined_metadata_from_row(row, entry.id);
        entries.push(EntryFull {
            project_name: row.get("project_name"),
            tags: Vec::new(),
            metadata,
            entry,
        });
    }

    let ids: Vec<Uuid> = entries.iter().map(|e| e.entry.id).collect();
    let mut tags = fetch_tag_names(pool, &ids).await?;
    for full in &mut entries {
        if let Some(names) = tags.remove(&full.entry.id) {
            full.tags = names;
        }
    }
    Ok(entries)
}

/// Tag names per entry, alphabetical, for a batch of entries.
pub(crate) async fn fetch_tag_names(
    pool: &Pool<Postgres>,
    entry_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<String>>> {
    let mut by_entry: HashMap<Uuid, Vec<String>> = HashMap::new();
    if entry_ids.is_empty() {
        return Ok(by_entry);
    }

    let rows = sqlx::query(
        r#"
        SELECT et.entry_id, t.name
        FROM entry_tag et
        JOIN tag t ON t.id = et.tag_id
        WHERE et.entry_id = ANY($1)
        ORDER BY et.entry_id, t.name
        "#,
    )
    .bind(entry_ids)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)?;

    for row in rows {
        by_entry
            .entry(row.get("entry_id"))
            .or_default()
            .push(row.get("name"));
    }
    Ok(by_entry)
}
