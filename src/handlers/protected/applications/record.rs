// handlers/protected/applications/record.rs - single-record CRUD handlers

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Extension,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::parse_application_id;
use crate::app::AppState;
use crate::database::models::{Application, ApplicationChanges, ApplicationFilter, NewApplication};
use crate::error::{ApiError, FieldError};
use crate::handlers::validation::ValidatedJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ListPayload};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    /// Negative paging is rejected; `limit` above `max_limit` is capped.
    pub fn into_filter(self, max_limit: i64) -> Result<ApplicationFilter, ApiError> {
        let mut errors = vec![];
        if self.limit.is_some_and(|l| l < 0) {
            errors.push(FieldError::new("limit", "value is too short"));
        }
        if self.offset.is_some_and(|o| o < 0) {
            errors.push(FieldError::new("offset", "value is too short"));
        }
        if !errors.is_empty() {
            return Err(ApiError::validation_error("Invalid query parameters", errors));
        }

        let limit = self.limit.map(|l| {
            if l > max_limit {
                warn!(requested = l, max_limit, "Capping list limit");
                max_limit
            } else {
                l
            }
        });

        Ok(ApplicationFilter {
            status: self.status.filter(|s| !s.trim().is_empty()),
            limit,
            offset: self.offset,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedId {
    pub id: Uuid,
}

/// GET /applications - The caller's live records, newest first.
pub async fn records_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<ListPayload<Application>> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let filter = query.into_filter(state.config.filter.max_limit)?;

    let rows = state.applications.list_records(auth.user_id, filter).await?;
    Ok(ApiResponse::success("Applications fetched", ListPayload::from(rows)))
}

/// POST /applications - Create a record owned by the caller.
pub async fn records_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(new): ValidatedJson<NewApplication>,
) -> ApiResult<CreatedId> {
    let id = state.applications.create_record(auth.user_id, new).await?;
    Ok(ApiResponse::created("Application created", CreatedId { id }))
}

/// PUT /applications/:id - Partial update; absent fields are left alone.
pub async fn record_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(changes): ValidatedJson<ApplicationChanges>,
) -> ApiResult<()> {
    let id = parse_application_id(&id)?;
    state.applications.update_record(auth.user_id, id, changes).await?;
    Ok(ApiResponse::message_only("Application updated"))
}

/// DELETE /applications/:id - Soft delete.
pub async fn record_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_application_id(&id)?;
    state.applications.delete_record(auth.user_id, id).await?;
    Ok(ApiResponse::message_only("Application deleted"))
}
