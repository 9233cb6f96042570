// handlers/public/auth/register.rs - POST /auth/register handler

use axum::extract::State;

use crate::app::AppState;
use crate::database::models::UserProfile;
use crate::handlers::validation::ValidatedJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::RegisterRequest;

/// POST /auth/register - Create a user account.
///
/// Emails are unique regardless of case; a duplicate answers 409.
pub async fn register_post(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<UserProfile> {
    let profile = state.users.register(request).await?;
    Ok(ApiResponse::created("User created", profile))
}
