// handlers/protected/applications/mod.rs - application record endpoints
//
// Collection:  GET/POST   /applications
// Record:      PUT/DELETE /applications/:id
// Batch:       DELETE /applications/batch/delete, PUT /applications/batch/status
// Lookup:      GET /applications/options

pub mod batch;
pub mod options;
pub mod record;

pub use batch::{batch_delete, batch_status_put};
pub use options::options_get;
pub use record::{record_delete, record_put, records_get, records_post};

use uuid::Uuid;

use crate::error::ApiError;

/// Path ids must be UUIDs; anything else is a 400, not a 404.
pub(crate) fn parse_application_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid application id: {}", raw)))
}
