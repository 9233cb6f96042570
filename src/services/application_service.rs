use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::database::models::{Application, ApplicationChanges, ApplicationFilter, NewApplication};
use crate::database::{ApplicationStore, RepositoryResult};

/// Status given to records created without one.
pub const DEFAULT_STATUS: &str = "Wishlist";

pub const STATUS_OPTIONS: &[&str] = &["Wishlist", "Applied", "Interviewing", "Offer", "Rejected", "Accepted", "Withdrawn"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationOptionsQuery {
    #[serde(default)]
    pub status_option: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_option: Option<Vec<String>>,
}

/// Business rules over an [`ApplicationStore`]. Errors pass through unchanged.
#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn ApplicationStore>,
}

impl ApplicationService {
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self { store }
    }

    pub async fn create_record(&self, owner_id: Uuid, mut new: NewApplication) -> RepositoryResult<Uuid> {
        if new.status.is_none() {
            new.status = Some(DEFAULT_STATUS.to_string());
        }
        let id = self.store.insert(owner_id, new).await?;
        info!(%owner_id, application_id = %id, "Created application");
        Ok(id)
    }

    pub async fn list_records(&self, owner_id: Uuid, filter: ApplicationFilter) -> RepositoryResult<Vec<Application>> {
        self.store.find_by_owner(owner_id, filter).await
    }

    pub async fn update_record(
        &self,
        owner_id: Uuid,
        record_id: Uuid,
        changes: ApplicationChanges,
    ) -> RepositoryResult<()> {
        self.store.update_fields(owner_id, record_id, changes).await
    }

    pub async fn delete_record(&self, owner_id: Uuid, record_id: Uuid) -> RepositoryResult<()> {
        self.store.soft_delete(owner_id, record_id).await?;
        info!(%owner_id, application_id = %record_id, "Soft-deleted application");
        Ok(())
    }

    pub async fn batch_delete(&self, owner_id: Uuid, ids: Vec<Uuid>) -> RepositoryResult<()> {
        self.store.batch_soft_delete(owner_id, ids).await
    }

    pub async fn batch_update_status(&self, owner_id: Uuid, ids: Vec<Uuid>, status: String) -> RepositoryResult<()> {
        self.store.batch_update_status(owner_id, ids, status).await
    }

    pub fn options(&self, query: &ApplicationOptionsQuery) -> ApplicationOptions {
        ApplicationOptions {
            status_option: query
                .status_option
                .unwrap_or(false)
                .then(|| STATUS_OPTIONS.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub async fn health_check(&self) -> RepositoryResult<()> {
        self.store.health_check().await
    }
}
