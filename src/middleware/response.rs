use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Success envelope: `{status, message, data?}`.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub message: String,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self::with_status(message, Some(data), StatusCode::OK)
    }

    /// Create a 201 Created response
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_status(message, Some(data), StatusCode::CREATED)
    }

    pub fn with_status(message: impl Into<String>, data: Option<T>, status_code: StatusCode) -> Self {
        Self {
            data,
            message: message.into(),
            status_code,
        }
    }
}

impl ApiResponse<()> {
    /// 200 with a message and no `data` key.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self::with_status(message, None, StatusCode::OK)
    }
}

/// List payload: `{data: [...], dataCount: n}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPayload<T: Serialize> {
    pub data: Vec<T>,
    pub data_count: usize,
}

impl<T: Serialize> From<Vec<T>> for ListPayload<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data_count: data.len(), data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code;

        let mut envelope = json!({
            "status": status.as_u16(),
            "message": self.message,
        });

        if let Some(data) = &self.data {
            match serde_json::to_value(data) {
                Ok(value) => envelope["data"] = value,
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "status": 500,
                            "message": "Failed to serialize response data",
                            "code": "INTERNAL_SERVER_ERROR"
                        })),
                    )
                        .into_response();
                }
            }
        }

        (status, Json(envelope)).into_response()
    }
}

// Convenience type alias
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
