//! Entry template repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use brainshelf_core::{
    new_v7, normalize_tag_names, stamp_on_write, CreateTemplateRequest, Error, Result, Template,
    TemplateRepository, UpdateTemplateRequest, WriteKind,
};

use crate::rows::parse_entry_type;

const TEMPLATE_COLUMNS: &str = r#"
    id, name, description, entry_type, title, content, tags, is_default, project_id,
    created_at, updated_at
"#;

fn template_from_row(row: &PgRow) -> Result<Template> {
    let entry_type: String = row.get("entry_type");
    Ok(Template {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        entry_type: parse_entry_type(&entry_type)?,
        title: row.get("title"),
        content: row.get("content"),
        tags: row.get("tags"),
        is_default: row.get("is_default"),
        project_id: row.get("project_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn template_not_found(id: Uuid) -> Error {
    Error::NotFound(format!("Template with ID {} not found", id))
}

/// PostgreSQL implementation of TemplateRepository.
#[derive(Clone)]
pub struct PgTemplateRepository {
    pool: Pool<Postgres>,
}

impl PgTemplateRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn write(&self, template: &Template, kind: WriteKind) -> Result<u64> {
        let sql = match kind {
            WriteKind::Create => {
                r#"
                INSERT INTO template (id, name, description, entry_type, title, content, tags,
                                      is_default, project_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#
            }
            WriteKind::Update => {
                r#"
                UPDATE template
                SET name = $2, description = $3, entry_type = $4, title = $5, content = $6,
                    tags = $7, is_default = $8, project_id = $9, updated_at = $11
                WHERE id = $1 AND created_at = $10
                "#
            }
        };

        let result = sqlx::query(sql)
            .bind(template.id)
            .bind(&template.name)
            .bind(&template.description)
            .bind(template.entry_type.as_str())
            .bind(&template.title)
            .bind(&template.content)
            .bind(&template.tags)
            .bind(template.is_default)
            .bind(template.project_id)
            .bind(template.created_at)
            .bind(template.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let err = Error::Database(e);
                if err.is_foreign_key_violation() {
                    Error::NotFound(format!(
                        "Project with ID {} not found",
                        template.project_id.unwrap_or_default()
                    ))
                } else {
                    err
                }
            })?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TemplateRepository for PgTemplateRepository {
    async fn list(&self, project_id: Option<Uuid>) -> Result<Vec<Template>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM template
            WHERE $1::uuid IS NULL OR project_id = $1 OR project_id IS NULL
            ORDER BY name, id
            "#,
            TEMPLATE_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(template_from_row).collect()
    }

    async fn list_defaults(&self) -> Result<Vec<Template>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM template WHERE is_default ORDER BY name, id",
            TEMPLATE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(template_from_row).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Template>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM template WHERE id = $1",
            TEMPLATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(template_from_row).transpose()
    }

    async fn create(&self, req: CreateTemplateRequest) -> Result<Template> {
        let now = Utc::now();
        let template = stamp_on_write(
            Template {
                id: new_v7(),
                name: req.name.trim().to_string(),
                description: req.description,
                entry_type: req.entry_type,
                title: req.title,
                content: req.content,
                tags: normalize_tag_names(&req.tags),
                is_default: req.is_default,
                project_id: req.project_id,
                created_at: now,
                updated_at: now,
            },
            WriteKind::Create,
            now,
        );

        self.write(&template, WriteKind::Create).await?;
        Ok(template)
    }

    async fn update(&self, id: Uuid, req: UpdateTemplateRequest) -> Result<Template> {
        let existing = self.get(id).await?.ok_or_else(|| template_not_found(id))?;

        let template = stamp_on_write(
            Template {
                name: req.name.trim().to_string(),
                description: req.description,
                entry_type: req.entry_type,
                title: req.title,
                content: req.content,
                tags: normalize_tag_names(&req.tags),
                is_default: req.is_default,
                project_id: req.project_id,
                ..existing
            },
            WriteKind::Update,
            Utc::now(),
        );

        if self.write(&template, WriteKind::Update).await? == 0 {
            return Err(template_not_found(id));
        }
        Ok(template)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM template WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
