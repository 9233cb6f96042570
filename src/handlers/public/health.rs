// handlers/public/health.rs - GET /health handler

use axum::extract::State;
use serde::Serialize;
use tracing::warn;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub database: &'static str,
    pub version: &'static str,
}

/// GET /health - Pings the database; 503 when it is unreachable.
pub async fn health_get(State(state): State<AppState>) -> ApiResult<HealthStatus> {
    if let Err(e) = state.applications.health_check().await {
        warn!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Database unavailable"));
    }

    Ok(ApiResponse::success(
        "OK",
        HealthStatus {
            database: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    ))
}
