//! # brainshelf-jobs
//!
//! Background page-metadata extraction for link entries.
//!
//! The entry repository emits `MetadataRequested` on the event bus whenever a
//! Link entry's URL is set or changed. [`MetadataWorker`] consumes those
//! events, fetches the page with [`MetadataExtractor`], parses it, and upserts
//! the result through the metadata repository.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use brainshelf_core::EventBus;
//! use brainshelf_db::Database;
//! use brainshelf_jobs::{MetadataWorker, WorkerConfig};
//!
//! let bus = Arc::new(EventBus::default());
//! let db = Database::connect("postgres://...").await?.with_event_bus(bus.clone());
//!
//! let handle = MetadataWorker::from_database(&db, bus, WorkerConfig::from_env())?.start();
//!
//! // Graceful shutdown
//! handle.shutdown().await?;
//! ```

pub mod extractor;
pub mod html;
pub mod worker;

// Re-export core types
pub use brainshelf_core::*;

pub use extractor::{ExtractorConfig, MetadataExtractor, PageFetcher};
pub use html::extract_metadata;
pub use worker::{MetadataWorker, WorkerConfig, WorkerEvent, WorkerHandle};
