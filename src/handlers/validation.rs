// handlers/validation.rs - request body validation shared by all handlers

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use email_address::EmailAddress;
use serde::de::DeserializeOwned;

use crate::database::models::{ApplicationChanges, NewApplication};
use crate::error::{ApiError, FieldError};
use crate::services::{LoginRequest, RegisterRequest};

pub const MSG_REQUIRED: &str = "this field is required";
pub const MSG_TOO_SHORT: &str = "value is too short";
pub const MSG_TOO_LONG: &str = "value is too long";
pub const MSG_INVALID_EMAIL: &str = "invalid email format";
pub const MSG_INVALID_URL: &str = "invalid url format";

/// `users.email` is VARCHAR(255).
pub const EMAIL_MAX_CHARS: usize = 255;

/// Field-level rules checked after a body deserializes.
pub trait Validate {
    fn validate(&self) -> Vec<FieldError>;
}

/// JSON body that deserialized and passed [`Validate`].
///
/// Malformed JSON, wrong types and non-UUID ids all reject with 400.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::invalid_json(rejection.body_text()))?;

        let errors = value.validate();
        if !errors.is_empty() {
            return Err(ApiError::validation_error("Validation failed", errors));
        }
        Ok(Self(value))
    }
}

/// Collects failures; the first failing rule per field wins.
#[derive(Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Returns false when the value is blank.
    pub fn required(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.fail(field, MSG_REQUIRED);
            return false;
        }
        true
    }

    /// Bounds are in characters, not bytes.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let count = value.chars().count();
        if count < min {
            self.fail(field, MSG_TOO_SHORT);
        } else if count > max {
            self.fail(field, MSG_TOO_LONG);
        }
    }

    pub fn required_length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        if self.required(field, value) {
            self.length(field, value, min, max);
        }
    }

    pub fn optional_length(&mut self, field: &str, value: Option<&str>, min: usize, max: usize) {
        if let Some(v) = value {
            self.length(field, v, min, max);
        }
    }

    /// Syntax plus the column bound, checked on the trimmed value.
    pub fn email(&mut self, field: &str, value: &str) {
        let value = value.trim();
        if value.chars().count() > EMAIL_MAX_CHARS {
            self.fail(field, MSG_TOO_LONG);
        } else if !EmailAddress::is_valid(value) {
            self.fail(field, MSG_INVALID_EMAIL);
        }
    }

    pub fn optional_url(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if url::Url::parse(v).is_err() {
                self.fail(field, MSG_INVALID_URL);
            }
        }
    }

    pub fn finish(self) -> Vec<FieldError> {
        self.errors
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut checks = Checks::new();
        if checks.required("email", &self.email) {
            checks.email("email", &self.email);
        }
        checks.required_length("firstName", &self.first_name, 2, 50);
        checks.required_length("lastName", &self.last_name, 2, 50);
        checks.required_length("password", &self.password, 8, 64);
        checks.finish()
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut checks = Checks::new();
        if checks.required("email", &self.email) {
            checks.email("email", &self.email);
        }
        checks.required("password", &self.password);
        checks.finish()
    }
}

impl Validate for NewApplication {
    fn validate(&self) -> Vec<FieldError> {
        let mut checks = Checks::new();
        checks.required_length("companyName", &self.company_name, 2, 255);
        checks.required_length("positionTitle", &self.position_title, 2, 255);
        checks.optional_url("jobUrl", self.job_url.as_deref());
        checks.optional_length("salaryRange", self.salary_range.as_deref(), 2, 100);
        checks.optional_length("location", self.location.as_deref(), 2, 100);
        checks.optional_length("status", self.status.as_deref(), 2, 50);
        checks.finish()
    }
}

impl Validate for ApplicationChanges {
    fn validate(&self) -> Vec<FieldError> {
        let mut checks = Checks::new();
        checks.optional_length("companyName", self.company_name.as_deref(), 2, 255);
        checks.optional_length("positionTitle", self.position_title.as_deref(), 2, 255);
        checks.optional_url("jobUrl", self.job_url.as_deref());
        checks.optional_length("salaryRange", self.salary_range.as_deref(), 2, 100);
        checks.optional_length("location", self.location.as_deref(), 2, 100);
        checks.optional_length("status", self.status.as_deref(), 2, 50);
        checks.finish()
    }
}
