//! Search engine façade over a full-text search provider.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use brainshelf_core::{EntryFull, FullTextSearch, Page, Result, SearchRequest};
use brainshelf_db::Database;

/// Trait for entry search operations.
#[async_trait]
pub trait EntrySearch: Send + Sync {
    /// Validate, prepare and execute a search.
    ///
    /// Invalid pagination or an inverted date range fails with
    /// `Error::Validation` before the provider is consulted.
    async fn search(&self, request: &SearchRequest) -> Result<Page<EntryFull>>;
}

/// Default engine: request validation and preparation in front of a
/// [`FullTextSearch`] provider.
#[derive(Clone)]
pub struct SearchEngine {
    fts: Arc<dyn FullTextSearch>,
}

impl SearchEngine {
    /// Engine backed by the database's PostgreSQL search provider.
    pub fn new(db: &Database) -> Self {
        Self::with_provider(Arc::new(db.search.clone()))
    }

    pub fn with_provider(fts: Arc<dyn FullTextSearch>) -> Self {
        Self { fts }
    }
}

#[async_trait]
impl EntrySearch for SearchEngine {
    #[instrument(skip(self, request), fields(
        subsystem = "search",
        component = "engine",
        op = "search",
        query = %request.query,
        order = ?request.order,
    ))]
    async fn search(&self, request: &SearchRequest) -> Result<Page<EntryFull>> {
        let start = Instant::now();
        request.validate()?;

        let prepared = request.prepare();
        debug!(
            text_query = prepared.is_text_query(),
            effective_order = ?prepared.order,
            page_number = prepared.page.page_number,
            page_size = prepared.page.page_size,
            "Prepared search"
        );

        let page = self.fts.search(&prepared).await?;

        info!(
            result_count = page.items.len(),
            total_count = page.total_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Search completed"
        );
        Ok(page)
    }
}
