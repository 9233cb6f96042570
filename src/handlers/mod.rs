// handlers/mod.rs - two-tier handler layout
//
// Public (no auth) and Protected (bearer JWT). Routing lives in `app.rs`.
pub mod protected;
pub mod public;
pub mod validation;

use axum::response::IntoResponse;

use crate::error::ApiError;

/// Fallback for unmatched paths
pub async fn not_found() -> impl IntoResponse {
    ApiError::not_found("Route not found")
}
