//! Project repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use brainshelf_core::{
    defaults, new_v7, stamp_on_write, CreateProjectRequest, Error, Page, PageRequest, Project,
    ProjectRepository, Result, UpdateProjectRequest, WriteKind,
};

fn project_from_row(row: &PgRow) -> Project {
    Project {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        color: row.get("color"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn color_or_default(color: Option<String>) -> String {
    color
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| defaults::PROJECT_COLOR.to_string())
}

/// PostgreSQL implementation of ProjectRepository.
#[derive(Clone)]
pub struct PgProjectRepository {
    pool: Pool<Postgres>,
}

impl PgProjectRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn list(&self, page: PageRequest) -> Result<Page<Project>> {
        let page = page.clamped();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM project")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, description, color, created_at, updated_at
            FROM project
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Page::new(
            rows.iter().map(project_from_row).collect(),
            total,
            page,
        ))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Project>> {
        let row = sqlx::query(
            "SELECT id, name, description, color, created_at, updated_at FROM project WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(project_from_row))
    }

    async fn create(&self, req: CreateProjectRequest) -> Result<Project> {
        let now = Utc::now();
        let project = stamp_on_write(
            Project {
                id: new_v7(),
                name: req.name.trim().to_string(),
                description: req.description,
                color: color_or_default(req.color),
                created_at: now,
                updated_at: now,
            },
            WriteKind::Create,
            now,
        );

        sqlx::query(
            r#"
            INSERT INTO project (id, name, description, color, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.color)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(project)
    }

    async fn update(&self, id: Uuid, req: UpdateProjectRequest) -> Result<Project> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Project with ID {} not found", id)))?;

        let project = stamp_on_write(
            Project {
                name: req.name.trim().to_string(),
                description: req.description,
                color: color_or_default(req.color),
                ..existing
            },
            WriteKind::Update,
            Utc::now(),
        );

        let result = sqlx::query(
            r#"
            UPDATE project SET name = $2, description = $3, color = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.color)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Project with ID {} not found", id)));
        }
        Ok(project)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM project WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
