/// Health check endpoint
///
/// ```text
/// GET /health
/// GET /api/v1/health
/// ```
///
/// ```json
/// { "status": "ok", "timestamp": "2025-01-01T00:00:00Z" }
/// ```
///
/// Answers 500 `HEALTH_CHECK_ERROR` when the store is unreachable.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use workboard_shared::services::health::{check_health, HealthStatus};

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthStatus>> {
    Ok(Json(check_health(state.store()).await?))
}
