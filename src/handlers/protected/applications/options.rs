// handlers/protected/applications/options.rs - GET /applications/options

use axum::extract::{rejection::QueryRejection, Query, State};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{ApplicationOptions, ApplicationOptionsQuery};

/// Static lookup lists; `?statusOption=true` includes the status list.
pub async fn options_get(
    State(state): State<AppState>,
    query: Result<Query<ApplicationOptionsQuery>, QueryRejection>,
) -> ApiResult<ApplicationOptions> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(ApiResponse::success("Options fetched", state.applications.options(&query)))
}
