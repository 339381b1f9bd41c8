//! `GET /health`

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use brainshelf_db::log_pool_metrics;

use crate::AppState;

/// 200 when the database answers, 503 otherwise.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.db.ping().await {
        Ok(()) => {
            log_pool_metrics(state.db.pool());
            (
                StatusCode::OK,
                Json(json!({ "status": "healthy", "database": "connected" })),
            )
        }
        Err(e) => {
            warn!(error = %e, "Health check failed to reach database");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "database": "unreachable" })),
            )
        }
    }
}
