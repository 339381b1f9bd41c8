//! Centralized default constants for brainshelf.
//!
//! All magic numbers that control limits, page sizes, and worker behavior
//! live here so that every crate agrees on them.

// =============================================================================
// PAGINATION
// =============================================================================

/// First page number (pages are 1-based).
pub const PAGE_NUMBER: i64 = 1;

/// Default page size for list and search endpoints.
pub const PAGE_SIZE: i64 = 20;

/// Smallest page size a request is clamped to.
pub const PAGE_SIZE_MIN: i64 = 1;

/// Largest page size a request is clamped to.
pub const PAGE_SIZE_MAX: i64 = 100;

// =============================================================================
// FIELD LIMITS
// =============================================================================

pub const ENTRY_TITLE_MAX_LEN: usize = 500;
pub const ENTRY_DESCRIPTION_MAX_LEN: usize = 2000;
pub const TAG_NAME_MAX_LEN: usize = 100;
pub const PROJECT_NAME_MAX_LEN: usize = 200;
pub const PROJECT_DESCRIPTION_MAX_LEN: usize = 1000;
pub const TEMPLATE_NAME_MAX_LEN: usize = 200;
pub const TEMPLATE_DESCRIPTION_MAX_LEN: usize = 1000;

/// Color assigned to projects created without one.
pub const PROJECT_COLOR: &str = "#3B82F6";

// =============================================================================
// TAG LISTS
// =============================================================================

/// Default `limit` for popular and recently-used tag lists.
pub const TAG_LIST_LIMIT: i64 = 20;

/// Upper bound accepted for tag list `limit` parameters.
pub const TAG_LIST_LIMIT_MAX: i64 = 1000;

/// Length of the top lists embedded in tag statistics.
pub const TAG_STATISTICS_TOP_N: i64 = 10;

// =============================================================================
// EVENTS & METADATA WORKER
// =============================================================================

/// Broadcast buffer capacity of the event bus.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Concurrent page fetches performed by the metadata worker.
pub const METADATA_MAX_CONCURRENT: usize = 4;

/// Per-page fetch timeout in seconds.
pub const METADATA_FETCH_TIMEOUT_SECS: u64 = 10;

/// Upper bound on the HTML body read for metadata extraction.
pub const METADATA_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// User agent sent when fetching pages.
pub const METADATA_USER_AGENT: &str = "Mozilla/5.0 (compatible; BrainShelf/1.0)";

// =============================================================================
// HTTP SERVER
// =============================================================================

pub const SERVER_HOST: &str = "0.0.0.0";
pub const SERVER_PORT: u16 = 5000;

/// Per-request deadline applied by the HTTP layer.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
