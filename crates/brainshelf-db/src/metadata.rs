//! Page metadata repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgExecutor, Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use brainshelf_core::{
    new_v7, stamp_on_write, Error, ExtractedMetadata, Metadata, MetadataRepository, Result,
    WriteKind,
};

use crate::rows::metadata_from_row;

const METADATA_COLUMNS: &str = r#"
    id, entry_id, title, description, keywords, image_url, favicon_url, author,
    site_name, created_at, updated_at
"#;

/// PostgreSQL implementation of MetadataRepository.
#[derive(Clone)]
pub struct PgMetadataRepository {
    pool: Pool<Postgres>,
}

impl PgMetadataRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataRepository for PgMetadataRepository {
    async fn get_for_entry(&self, entry_id: Uuid) -> Result<Option<Metadata>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM metadata WHERE entry_id = $1",
            METADATA_COLUMNS
        ))
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(metadata_from_row))
    }

    async fn upsert(&self, entry_id: Uuid, extracted: ExtractedMetadata) -> Result<Metadata> {
        let stored = write_metadata(&self.pool, entry_id, extracted).await?;
        debug!(
            subsystem = "db",
            component = "metadata",
            op = "upsert",
            entry_id = %entry_id,
            "Metadata stored"
        );
        Ok(stored)
    }

    async fn upsert_for_url(
        &self,
        entry_id: Uuid,
        source_url: &str,
        extracted: ExtractedMetadata,
    ) -> Result<Option<Metadata>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // FOR SHARE blocks a concurrent URL update until this write commits.
        let current: Option<Option<String>> =
            sqlx::query_scalar("SELECT url FROM entry WHERE id = $1 FOR SHARE")
                .bind(entry_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;

        let current = current.ok_or_else(|| entry_not_found(entry_id))?;
        if current.as_deref() != Some(source_url) {
            debug!(
                subsystem = "db",
                component = "metadata",
                op = "upsert_for_url",
                entry_id = %entry_id,
                "Entry URL changed since fetch, metadata discarded"
            );
            return Ok(None);
        }

        let stored = write_metadata(&mut *tx, entry_id, extracted).await?;
        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "metadata",
            op = "upsert_for_url",
            entry_id = %entry_id,
            "Metadata stored"
        );
        Ok(Some(stored))
    }
}

fn entry_not_found(entry_id: Uuid) -> Error {
    Error::NotFound(format!("Entry with ID {} not found", entry_id))
}

/// Insert or overwrite the entry's metadata row. On conflict the original id
/// and created_at survive.
async fn write_metadata<'e, E>(
    executor: E,
    entry_id: Uuid,
    extracted: ExtractedMetadata,
) -> Result<Metadata>
where
    E: PgExecutor<'e>,
{
    let now = Utc::now();
    let record = stamp_on_write(
        Metadata {
            id: new_v7(),
            entry_id,
            title: extracted.title,
            description: extracted.description,
            keywords: extracted.keywords,
            image_url: extracted.image_url,
            favicon_url: extracted.favicon_url,
            author: extracted.author,
            site_name: extracted.site_name,
            created_at: now,
            updated_at: now,
        },
        WriteKind::Create,
        now,
    );

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO metadata (id, entry_id, title, description, keywords, image_url,
                              favicon_url, author, site_name, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (entry_id) DO UPDATE SET
            title = EXCLUDED.title,
            description = EXCLUDED.description,
            keywords = EXCLUDED.keywords,
            image_url = EXCLUDED.image_url,
            favicon_url = EXCLUDED.favicon_url,
            author = EXCLUDED.author,
            site_name = EXCLUDED.site_name,
            updated_at = EXCLUDED.updated_at
        RETURNING {}
        "#,
        METADATA_COLUMNS
    ))
    .bind(record.id)
    .bind(record.entry_id)
    .bind(&record.title)
    .bind(&record.description)
    .bind(&record.keywords)
    .bind(&record.image_url)
    .bind(&record.favicon_url)
    .bind(&record.author)
    .bind(&record.site_name)
    .bind(record.created_at)
    .bind(record.updated_at)
    .fetch_one(executor)
    .await
    .map_err(|e| {
        let err = Error::Database(e);
        if err.is_foreign_key_violation() {
            entry_not_found(entry_id)
        } else {
            err
        }
    })?;

    Ok(metadata_from_row(&row))
}
