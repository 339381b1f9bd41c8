//! # brainshelf-core
//!
//! Core types, traits, and abstractions for brainshelf.
//!
//! This crate provides the foundational types used across all brainshelf crates:
//! - Domain models (entries, tags, projects, templates, page metadata)
//! - Repository traits implemented by `brainshelf-db`
//! - Tag-name normalization and full-text query sanitization
//! - Pagination clamping and write-time timestamp stamping
//! - Request validation with field-keyed error maps
//! - Event bus for out-of-band work (metadata extraction)

pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod pagination;
pub mod search;
pub mod tags;
pub mod timestamps;
pub mod traits;
pub mod uuid_utils;
pub mod validation;

pub use error::{Error, Result};
pub use events::{EventActor, EventBus, EventEnvelope, ServerEvent};
pub use models::*;
pub use pagination::{Page, PageRequest};
pub use search::{sanitize_tsquery, PreparedSearch, SearchOrder, SearchRequest};
pub use tags::{normalize_tag_name, normalize_tag_names, require_tag_name};
pub use timestamps::{stamp_on_write, Stamped, WriteKind};
pub use traits::*;
pub use uuid_utils::new_v7;
pub use validation::ValidationErrors;
