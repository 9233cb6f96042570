use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Columns read back for every fetch, in table order.
pub const APPLICATION_COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "company_name",
    "position_title",
    "job_url",
    "salary_range",
    "location",
    "status",
    "notes",
    "applied_date",
    "created_at",
    "updated_at",
    "deleted_at",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub position_title: String,
    pub job_url: Option<String>,
    pub salary_range: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub applied_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Field values for a new record; the owner comes from the caller identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub position_title: String,
    pub job_url: Option<String>,
    pub salary_range: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub applied_date: Option<DateTime<Utc>>,
}

/// Partial update: `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationChanges {
    pub company_name: Option<String>,
    pub position_title: Option<String>,
    pub job_url: Option<String>,
    pub salary_range: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub applied_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ApplicationFilter {
    pub fn with_status(status: impl Into<String>) -> Self {
        Self { status: Some(status.into()), ..Default::default() }
    }
}
