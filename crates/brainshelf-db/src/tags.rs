//! Tag store implementation.
//!
//! Tag names are normalized in Rust before they reach SQL, so equality on
//! `tag.name` is case-insensitive equality on the user's input. Usage counts
//! are always computed from `entry_tag` at read time.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use brainshelf_core::{
    new_v7, require_tag_name, stamp_on_write, Error, Result, Tag, TagMergeOutcome,
    TagRepository, TagStatistics, TagWithUsage, WriteKind,
};

use crate::escape_like;

const TAG_USAGE_SELECT: &str = r#"
    SELECT t.id, t.name, t.created_at, t.updated_at, COUNT(et.entry_id) AS usage_count
    FROM tag t
    LEFT JOIN entry_tag et ON et.tag_id = t.id
"#;

fn tag_with_usage_from_row(row: &PgRow) -> TagWithUsage {
    TagWithUsage {
        id: row.get("id"),
        name: row.get("name"),
        usage_count: row.get("usage_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn tag_from_row(row: &PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn tag_not_found(id: Uuid) -> Error {
    Error::NotFound(format!("Tag with ID {} not found", id))
}

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn require_with_usage(&self, id: Uuid) -> Result<TagWithUsage> {
        self.get(id).await?.ok_or_else(|| tag_not_found(id))
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn create(&self, name: &str) -> Result<Tag> {
        let name = require_tag_name(name)?;
        let now = Utc::now();

        let tag = stamp_on_write(
            Tag {
                id: new_v7(),
                name,
                created_at: now,
                updated_at: now,
            },
            WriteKind::Create,
            now,
        );

        // The no-op update makes RETURNING yield the existing row when the
        // name is already taken, including by a concurrent insert.
        let row = sqlx::query(
            r#"
            INSERT INTO tag (id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, created_at, updated_at, (xmax = 0) AS inserted
            "#,
        )
        .bind(tag.id)
        .bind(&tag.name)
        .bind(tag.created_at)
        .bind(tag.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let stored = tag_from_row(&row);
        if row.get::<bool, _>("inserted") {
            debug!(
                subsystem = "db",
                component = "tag_store",
                op = "create",
                tag_id = %stored.id,
                "Tag created"
            );
        }
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<TagWithUsage>> {
        let row = sqlx::query(&format!(
            "{} WHERE t.id = $1 GROUP BY t.id",
            TAG_USAGE_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(tag_with_usage_from_row))
    }

    async fn list(&self) -> Result<Vec<TagWithUsage>> {
        self.search("").await
    }

    async fn search(&self, substring: &str) -> Result<Vec<TagWithUsage>> {
        let needle = substring.trim();
        let pattern = if needle.is_empty() {
            None
        } else {
            Some(format!("%{}%", escape_like(needle)))
        };

        let rows = sqlx::query(&format!(
            r#"{}
            WHERE ($1::text IS NULL OR t.name ILIKE $1 ESCAPE '\')
            GROUP BY t.id
            ORDER BY t.name
            "#,
            TAG_USAGE_SELECT
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(tag_with_usage_from_row).collect())
    }

    async fn list_by_usage(&self, limit: i64) -> Result<Vec<TagWithUsage>> {
        let rows = sqlx::query(&format!(
            r#"{}
            GROUP BY t.id
            ORDER BY usage_count DESC, t.name
            LIMIT $1
            "#,
            TAG_USAGE_SELECT
        ))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(tag_with_usage_from_row).collect())
    }

    async fn list_recently_used(&self, limit: i64) -> Result<Vec<TagWithUsage>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.created_at, t.updated_at,
                   COUNT(et.entry_id) AS usage_count,
                   MAX(e.updated_at) AS last_used_at
            FROM tag t
            JOIN entry_tag et ON et.tag_id = t.id
            JOIN entry e ON e.id = et.entry_id
            GROUP BY t.id
            ORDER BY last_used_at DESC, t.name
            LIMIT $1
            "#,
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(tag_with_usage_from_row).collect())
    }

    async fn list_unused(&self) -> Result<Vec<TagWithUsage>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.created_at, t.updated_at, 0::bigint AS usage_count
            FROM tag t
            WHERE NOT EXISTS (SELECT 1 FROM entry_tag et WHERE et.tag_id = t.id)
            ORDER BY t.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(tag_with_usage_from_row).collect())
    }

    #[instrument(
        skip(self, new_name),
        fields(subsystem = "db", component = "tag_store", op = "rename", tag_id = %id)
    )]
    async fn rename(&self, id: Uuid, new_name: &str) -> Result<TagWithUsage> {
        let name = require_tag_name(new_name)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query(
            "SELECT id, name, created_at, updated_at FROM tag WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| tag_not_found(id))?;
        let current = tag_from_row(&row);

        let taken: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM tag WHERE name = $1 AND id <> $2")
                .bind(&name)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if taken.is_some() {
            return Err(Error::Conflict(format!(
                "A tag with name '{}' already exists. Use merge instead.",
                name
            )));
        }

        let old_name = current.name.clone();
        let renamed = stamp_on_write(Tag { name, ..current }, WriteKind::Update, Utc::now());

        // Two renames racing onto the same name both pass the check above;
        // the unique constraint rejects the second.
        sqlx::query("UPDATE tag SET name = $1, updated_at = $2 WHERE id = $3")
            .bind(&renamed.name)
            .bind(renamed.updated_at)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                let err = Error::Database(e);
                if err.is_unique_violation() {
                    Error::Conflict(format!(
                        "A tag with name '{}' already exists. Use merge instead.",
                        renamed.name
                    ))
                } else {
                    err
                }
            })?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(old_name = %old_name, new_name = %renamed.name, "Tag renamed");
        self.require_with_usage(id).await
    }

    #[instrument(
        skip(self),
        fields(subsystem = "db", component = "tag_store", op = "merge")
    )]
    async fn merge(&self, source_id: Uuid, target_id: Uuid) -> Result<TagMergeOutcome> {
        if source_id == target_id {
            return Err(Error::InvalidOperation(
                "Cannot merge a tag with itself".to_string(),
            ));
        }

        let start = Instant::now();
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Lock both rows in id order so concurrent merges over the same pair
        // cannot deadlock.
        let locked: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM tag WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(vec![source_id, target_id])
                .fetch_all(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if !locked.contains(&source_id) {
            return Err(tag_not_found(source_id));
        }
        if !locked.contains(&target_id) {
            return Err(tag_not_found(target_id));
        }

        let reassigned = sqlx::query(
            r#"
            UPDATE entry SET updated_at = $2
            WHERE id IN (SELECT entry_id FROM entry_tag WHERE tag_id = $1)
            "#,
        )
        .bind(source_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?
        .rows_affected() as i64;

        sqlx::query(
            r#"
            INSERT INTO entry_tag (entry_id, tag_id)
            SELECT entry_id, $2 FROM entry_tag WHERE tag_id = $1
            ON CONFLICT (entry_id, tag_id) DO NOTHING
            "#,
        )
        .bind(source_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        // Cascades the source's remaining associations.
        sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(source_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        sqlx::query("UPDATE tag SET updated_at = $2 WHERE id = $1")
            .bind(target_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            source_id = %source_id,
            target_id = %target_id,
            reassigned,
            duration_ms = start.elapsed().as_millis() as u64,
            "Tags merged"
        );

        Ok(TagMergeOutcome {
            source_id,
            target_id,
            reassigned_entries: reassigned,
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(tag_not_found(id));
        }
        debug!(
            subsystem = "db",
            component = "tag_store",
            op = "delete",
            tag_id = %id,
            "Tag deleted"
        );
        Ok(())
    }

    async fn statistics(&self) -> Result<TagStatistics> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tag) AS total_tags,
                (SELECT COUNT(*) FROM entry_tag) AS total_usages
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(TagStatistics {
            total_tags: row.get("total_tags"),
            total_usages: row.get("total_usages"),
        })
    }
}
