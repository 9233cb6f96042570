// handlers/protected/auth/verify.rs - GET /auth/verify handler

use axum::Extension;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /auth/verify - Confirms the bearer token and echoes the caller id.
pub async fn verify_get(Extension(auth): Extension<AuthUser>) -> ApiResult<Uuid> {
    Ok(ApiResponse::success("Token valid", auth.user_id))
}
