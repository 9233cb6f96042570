// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::State;

use crate::app::AppState;
use crate::handlers::validation::ValidatedJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::LoginRequest;

/// POST /auth/login - Authenticate with email and password, receive a JWT.
///
/// Unknown email and wrong password both answer 401 with the same message.
pub async fn login_post(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<String> {
    let token = state.users.login(request).await?;
    Ok(ApiResponse::success("Login success", token))
}
