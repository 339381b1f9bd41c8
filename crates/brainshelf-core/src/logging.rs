//! Structured logging schema and field name constants for brainshelf.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by the same field names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), write completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the `x-request-id` header.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "search", "db", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "tag_store", "entries", "fts", "metadata_worker", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "search", "rename", "merge", "extract"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

pub const ENTRY_ID: &str = "entry_id";
pub const TAG_ID: &str = "tag_id";
pub const PROJECT_ID: &str = "project_id";
pub const TEMPLATE_ID: &str = "template_id";

/// Search query text.
pub const QUERY: &str = "query";

/// Page URL being fetched.
pub const URL: &str = "url";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Pre-pagination match count.
pub const TOTAL_COUNT: &str = "total_count";

/// Entries touched by a tag merge.
pub const REASSIGNED: &str = "reassigned";

// ─── Database fields ───────────────────────────────────────────────────────

pub const POOL_SIZE: &str = "pool_size";
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

pub const SUCCESS: &str = "success";
pub const ERROR_MSG: &str = "error";
