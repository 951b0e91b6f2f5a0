//! Health check handler.

use crate::models::HealthResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /health
///
/// Pings the database and reports the result. Always answers 200 so the
/// orchestrator can read the body.
///
/// ```json
/// {
///   "status": "healthy",
///   "instance_id": "poll-1a2b3c4d",
///   "database": "healthy"
/// }
/// ```
#[instrument(skip_all, name = "poll.health.check")]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let db_healthy = sqlx::query("SELECT 1").fetch_one(&state.pool).await.is_ok();

    let status = if db_healthy { "healthy" } else { "unhealthy" };

    if !db_healthy {
        tracing::warn!(target: "poll.health", "Database ping failed");
    }

    Json(HealthResponse {
        status: status.to_string(),
        instance_id: state.config.instance_id.clone(),
        database: Some(status.to_string()),
    })
}
