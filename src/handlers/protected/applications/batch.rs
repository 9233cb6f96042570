// handlers/protected/applications/batch.rs - multi-record handlers

use axum::{extract::State, Extension};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::FieldError;
use crate::handlers::validation::{Checks, Validate, ValidatedJson};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// An empty or missing id list is a 400 raised by the store layer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteRequest {
    #[serde(default)]
    pub application_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatusRequest {
    #[serde(default)]
    pub application_ids: Vec<Uuid>,
    #[serde(default)]
    pub status: String,
}

impl Validate for BatchDeleteRequest {
    fn validate(&self) -> Vec<FieldError> {
        vec![]
    }
}

impl Validate for BatchStatusRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut checks = Checks::new();
        checks.required_length("status", &self.status, 2, 50);
        checks.finish()
    }
}

/// DELETE /applications/batch/delete - Soft delete every listed record the
/// caller owns. Succeeds when at least one matched.
pub async fn batch_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(request): ValidatedJson<BatchDeleteRequest>,
) -> ApiResult<()> {
    state.applications.batch_delete(auth.user_id, request.application_ids).await?;
    Ok(ApiResponse::message_only("Applications deleted"))
}

/// PUT /applications/batch/status
pub async fn batch_status_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(request): ValidatedJson<BatchStatusRequest>,
) -> ApiResult<()> {
    state
        .applications
        .batch_update_status(auth.user_id, request.application_ids, request.status)
        .await?;
    Ok(ApiResponse::message_only("Application statuses updated"))
}
