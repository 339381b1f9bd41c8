//! # brainshelf-search
//!
//! Ranked, filtered, paginated retrieval of entries.
//!
//! The engine validates a [`SearchRequest`], sanitizes its free text into a
//! tsquery expression, picks the ordering, and hands the prepared search to a
//! [`FullTextSearch`] provider (PostgreSQL by default).
//!
//! ## Example
//!
//! ```ignore
//! use brainshelf_search::{SearchEngine, SearchRequest, SearchOrder};
//! use brainshelf_db::Database;
//!
//! let db = Database::connect("postgres://...").await?;
//! let engine = SearchEngine::new(&db);
//!
//! let page = engine
//!     .search(&SearchRequest::new("go concurrency")
//!         .with_project(project_id)
//!         .with_order(SearchOrder::Relevance))
//!     .await?;
//! ```

pub mod engine;

// Re-export core types
pub use brainshelf_core::*;

pub use engine::{EntrySearch, SearchEngine};
