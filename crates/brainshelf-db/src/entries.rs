//! Entry repository implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use brainshelf_core::{
    new_v7, normalize_tag_names, stamp_on_write, CreateEntryRequest, Entry, EntryFull,
    EntryRepository, Error, EventBus, ListEntriesRequest, Page, Result, ServerEvent,
    UpdateEntryRequest, WriteKind,
};

use crate::rows::{entries_full_from_rows, entry_from_row, ENTRY_FULL_COLUMNS, ENTRY_FULL_JOINS};

fn entry_not_found(id: Uuid) -> Error {
    Error::NotFound(format!("Entry with ID {} not found", id))
}

/// Treat whitespace-only optional text as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Resolve normalized tag names to ids, creating missing tags, and attach
/// them to the entry. Runs inside the caller's transaction.
async fn attach_tags(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: Uuid,
    raw_names: &[String],
    now: DateTime<Utc>,
) -> Result<()> {
    let names = normalize_tag_names(raw_names);
    if names.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = names.iter().map(|_| new_v7()).collect();

    sqlx::query(
        r#"
        INSERT INTO tag (id, name, created_at, updated_at)
        SELECT u.id, u.name, $3, $3
        FROM UNNEST($1::uuid[], $2::text[]) AS u(id, name)
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(&ids)
    .bind(&names)
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(Error::Database)?;

    sqlx::query(
        r#"
        INSERT INTO entry_tag (entry_id, tag_id)
        SELECT $1, t.id FROM tag t WHERE t.name = ANY($2)
        ON CONFLICT (entry_id, tag_id) DO NOTHING
        "#,
    )
    .bind(entry_id)
    .bind(&names)
    .execute(&mut **tx)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

/// PostgreSQL implementation of EntryRepository.
#[derive(Clone)]
pub struct PgEntryRepository {
    pool: Pool<Postgres>,
    events: Option<Arc<EventBus>>,
}

impl PgEntryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool, events: None }
    }

    /// Emit entry and metadata events on `bus` after each committed write.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    fn emit(&self, event: ServerEvent) {
        if let Some(bus) = &self.events {
            bus.emit(event);
        }
    }

    fn request_metadata(&self, entry: &Entry) {
        if !entry.wants_metadata() {
            return;
        }
        if let Some(url) = &entry.url {
            self.emit(ServerEvent::MetadataRequested {
                entry_id: entry.id,
                url: url.clone(),
            });
        }
    }

    async fn require_full(&self, id: Uuid) -> Result<EntryFull> {
        self.get(id).await?.ok_or_else(|| entry_not_found(id))
    }
}

#[async_trait]
impl EntryRepository for PgEntryRepository {
    async fn list(&self, req: ListEntriesRequest) -> Result<Page<EntryFull>> {
        let page = req.page.clamped();
        let entry_type = req.entry_type.map(|t| t.as_str().to_string());
        let tags = normalize_tag_names(&req.tags);

        const FILTER: &str = r#"
            WHERE ($1::uuid IS NULL OR e.project_id = $1)
              AND ($2::text IS NULL OR e.entry_type = $2)
              AND (cardinality($3::text[]) = 0 OR EXISTS (
                    SELECT 1 FROM entry_tag et
                    JOIN tag t ON t.id = et.tag_id
                    WHERE et.entry_id = e.id AND t.name = ANY($3)))
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM entry e {}", FILTER))
            .bind(req.project_id)
            .bind(&entry_type)
            .bind(&tags)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let rows = sqlx::query(&format!(
            "SELECT {} {} {} ORDER BY e.created_at DESC, e.id DESC LIMIT $4 OFFSET $5",
            ENTRY_FULL_COLUMNS, ENTRY_FULL_JOINS, FILTER
        ))
        .bind(req.project_id)
        .bind(&entry_type)
        .bind(&tags)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let items = entries_full_from_rows(&self.pool, rows).await?;
        Ok(Page::new(items, total, page))
    }

    async fn get(&self, id: Uuid) -> Result<Option<EntryFull>> {
        let rows = sqlx::query(&format!(
            "SELECT {} {} WHERE e.id = $1",
            ENTRY_FULL_COLUMNS, ENTRY_FULL_JOINS
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(entries_full_from_rows(&self.pool, rows).await?.pop())
    }

    #[instrument(
        skip(self, req),
        fields(subsystem = "db", component = "entries", op = "create", project_id = %req.project_id)
    )]
    async fn create(&self, req: CreateEntryRequest) -> Result<EntryFull> {
        let now = Utc::now();
        let entry = stamp_on_write(
            Entry {
                id: new_v7(),
                project_id: req.project_id,
                title: req.title.trim().to_string(),
                description: non_blank(req.description),
                entry_type: req.entry_type,
                content: req.content,
                url: non_blank(req.url),
                created_at: now,
                updated_at: now,
            },
            WriteKind::Create,
            now,
        );

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let project_exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM project WHERE id = $1 FOR KEY SHARE")
                .bind(entry.project_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if project_exists.is_none() {
            return Err(Error::NotFound(format!(
                "Project with ID {} not found",
                entry.project_id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO entry (id, project_id, title, description, entry_type, content, url,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id)
        .bind(entry.project_id)
        .bind(&entry.title)
        .bind(&entry.description)
        .bind(entry.entry_type.as_str())
        .bind(&entry.content)
        .bind(&entry.url)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        attach_tags(&mut tx, entry.id, &req.tags, now).await?;

        tx.commit().await.map_err(Error::Database)?;

        info!(entry_id = %entry.id, entry_type = %entry.entry_type, "Entry created");
        self.emit(ServerEvent::EntryCreated {
            entry_id: entry.id,
            project_id: entry.project_id,
        });
        self.request_metadata(&entry);

        self.require_full(entry.id).await
    }

    #[instrument(
        skip(self, req),
        fields(subsystem = "db", component = "entries", op = "update", entry_id = %id)
    )]
    async fn update(&self, id: Uuid, req: UpdateEntryRequest) -> Result<EntryFull> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query(
            r#"
            SELECT id, project_id, title, description, entry_type, content, url,
                   created_at, updated_at
            FROM entry WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| entry_not_found(id))?;
        let existing = entry_from_row(&row)?;
        let previous_url = existing.url.clone();

        let entry = stamp_on_write(
            Entry {
                title: req.title.trim().to_string(),
                description: non_blank(req.description),
                entry_type: req.entry_type,
                content: req.content,
                url: non_blank(req.url),
                ..existing
            },
            WriteKind::Update,
            now,
        );

        sqlx::query(
            r#"
            UPDATE entry
            SET title = $2, description = $3, entry_type = $4, content = $5, url = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&entry.title)
        .bind(&entry.description)
        .bind(entry.entry_type.as_str())
        .bind(&entry.content)
        .bind(&entry.url)
        .bind(entry.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query("DELETE FROM entry_tag WHERE entry_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        attach_tags(&mut tx, id, &req.tags, now).await?;

        tx.commit().await.map_err(Error::Database)?;

        let url_changed = previous_url != entry.url;
        debug!(url_changed, "Entry updated");
        self.emit(ServerEvent::EntryUpdated { entry_id: id });
        if url_changed {
            self.request_metadata(&entry);
        }

        self.require_full(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entry WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            debug!(
                subsystem = "db",
                component = "entries",
                op = "delete",
                entry_id = %id,
                "Entry deleted"
            );
            self.emit(ServerEvent::EntryDeleted { entry_id: id });
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(
            non_blank(Some("  https://a.b ".to_string())).as_deref(),
            Some("https://a.b")
        );
        assert!(non_blank(Some("   ".to_string())).is_none());
        assert!(non_blank(None).is_none());
    }

    #[test]
    fn test_entry_not_found_message() {
        let err = entry_not_found(Uuid::nil());
        assert!(matches!(err, Error::NotFound(_)));
    }
}
