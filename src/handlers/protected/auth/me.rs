// handlers/protected/auth/me.rs - GET /users/me handler

use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /users/me - Profile of the authenticated caller.
pub async fn me_get(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<UserProfile> {
    let profile = state.users.profile(auth.user_id).await?;
    Ok(ApiResponse::success("Profile fetched", profile))
}
