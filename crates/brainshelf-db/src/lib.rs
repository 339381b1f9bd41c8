//! # brainshelf-db
//!
//! PostgreSQL database layer for brainshelf.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for tags, entries, projects, templates and
//!   page metadata
//! - Two-language full-text search with PostgreSQL tsvector
//! - The tag consolidation workflow (rename, merge, delete)
//!
//! ## Example
//!
//! ```rust,ignore
//! use brainshelf_db::{Database, EntryRepository, CreateEntryRequest, EntryType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/brainshelf").await?;
//!
//!     let entry = db.entries.create(CreateEntryRequest {
//!         project_id,
//!         title: "Tokio internals".to_string(),
//!         description: None,
//!         entry_type: EntryType::Link,
//!         content: None,
//!         url: Some("https://tokio.rs/blog".to_string()),
//!         tags: vec!["Rust".to_string(), "async".to_string()],
//!     }).await?;
//!
//!     println!("Created entry: {}", entry.entry.id);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

pub mod consolidation;
pub mod entries;
pub mod metadata;
pub mod pool;
pub mod projects;
mod rows;
pub mod search;
pub mod tags;
pub mod templates;

// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use brainshelf_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub use consolidation::TagConsolidation;
pub use entries::PgEntryRepository;
pub use metadata::PgMetadataRepository;
pub use pool::{
    create_lazy_pool, create_pool, create_pool_with_config, log_pool_metrics, PoolConfig,
};
pub use projects::PgProjectRepository;
pub use search::PgFtsSearch;
pub use tags::PgTagRepository;
pub use templates::PgTemplateRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Canonical tag registry.
    pub tags: PgTagRepository,
    /// Entries with their tags and metadata.
    pub entries: PgEntryRepository,
    pub projects: PgProjectRepository,
    pub templates: PgTemplateRepository,
    /// Page metadata written by the extraction worker.
    pub metadata: PgMetadataRepository,
    /// Full-text search provider.
    pub search: PgFtsSearch,
    events: Option<Arc<EventBus>>,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            tags: PgTagRepository::new(pool.clone()),
            entries: PgEntryRepository::new(pool.clone()),
            projects: PgProjectRepository::new(pool.clone()),
            templates: PgTemplateRepository::new(pool.clone()),
            metadata: PgMetadataRepository::new(pool.clone()),
            search: PgFtsSearch::new(pool.clone()),
            events: None,
            pool,
        }
    }

    /// Route entry and tag events to `bus`.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.entries = self.entries.with_event_bus(bus.clone());
        self.events = Some(bus);
        self
    }

    /// Connect to database with default pool configuration.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Tag consolidation over this database's tag store.
    pub fn consolidation(&self) -> TagConsolidation<PgTagRepository> {
        let flow = TagConsolidation::new(self.tags.clone());
        match &self.events {
            Some(bus) => flow.with_event_bus(bus.clone()),
            None => flow,
        }
    }

    /// Round-trip a trivial query; used by the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
