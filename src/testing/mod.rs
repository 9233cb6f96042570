use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::app::{app, AppState};
use crate::auth::JwtKeys;
use crate::config::AppConfig;
use crate::database::applications::{MSG_NONE_DELETED, MSG_NONE_UPDATED, MSG_NOT_FOUND, MSG_NO_IDS};
use crate::database::models::{Application, ApplicationChanges, ApplicationFilter, NewApplication, NewUser, User};
use crate::database::{ApplicationStore, RepositoryError, RepositoryResult, UserStore};
use crate::services::{ApplicationService, UserService};

pub const TEST_JWT_SECRET: &str = "test-secret";

/// In-memory `ApplicationStore` with the same visibility rules as the
/// postgres repository.
#[derive(Default)]
pub struct MemoryApplicationStore {
    rows: RwLock<Vec<Application>>,
}

impl MemoryApplicationStore {
    fn visible(row: &Application, owner_id: Uuid) -> bool {
        row.user_id == owner_id && row.deleted_at.is_none()
    }
}

#[async_trait]
impl ApplicationStore for MemoryApplicationStore {
    async fn health_check(&self) -> RepositoryResult<()> {
        Ok(())
    }

    async fn insert(&self, owner_id: Uuid, new: NewApplication) -> RepositoryResult<Uuid> {
        let id = Uuid::new_v4();
        self.rows.write().await.push(Application {
            id,
            user_id: owner_id,
            company_name: new.company_name,
            position_title: new.position_title,
            job_url: new.job_url,
            salary_range: new.salary_range,
            location: new.location,
            status: new.status,
            notes: new.notes,
            applied_date: new.applied_date,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        });
        Ok(id)
    }

    async fn find_by_owner(&self, owner_id: Uuid, filter: ApplicationFilter) -> RepositoryResult<Vec<Application>> {
        let rows = self.rows.read().await;
        let mut found: Vec<Application> = rows
            .iter()
            .filter(|r| Self::visible(r, owner_id))
            .filter(|r| filter.status.is_none() || r.status == filter.status)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(found.into_iter().skip(offset).take(limit).collect())
    }

    async fn update_fields(&self, owner_id: Uuid, record_id: Uuid, changes: ApplicationChanges) -> RepositoryResult<()> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id == record_id && Self::visible(r, owner_id))
            .ok_or_else(|| RepositoryError::NotFound(MSG_NOT_FOUND.to_string()))?;

        row.updated_at = Some(Utc::now());
        if let Some(v) = changes.company_name {
            row.company_name = v;
        }
        if let Some(v) = changes.position_title {
            row.position_title = v;
        }
        if let Some(v) = changes.job_url {
            row.job_url = Some(v);
        }
        if let Some(v) = changes.salary_range {
            row.salary_range = Some(v);
        }
        if let Some(v) = changes.location {
            row.location = Some(v);
        }
        if let Some(v) = changes.status {
            row.status = Some(v);
        }
        if let Some(v) = changes.notes {
            row.notes = Some(v);
        }
        if let Some(v) = changes.applied_date {
            row.applied_date = Some(v);
        }
        Ok(())
    }

    async fn soft_delete(&self, owner_id: Uuid, record_id: Uuid) -> RepositoryResult<()> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id == record_id && Self::visible(r, owner_id))
            .ok_or_else(|| RepositoryError::NotFound(MSG_NOT_FOUND.to_string()))?;
        row.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn batch_soft_delete(&self, owner_id: Uuid, ids: Vec<Uuid>) -> RepositoryResult<()> {
        if ids.is_empty() {
            return Err(RepositoryError::BadRequest(MSG_NO_IDS.to_string()));
        }
        let now = Utc::now();
        let mut affected = 0;
        for row in self.rows.write().await.iter_mut() {
            if ids.contains(&row.id) && Self::visible(row, owner_id) {
                row.deleted_at = Some(now);
                affected += 1;
            }
        }
        if affected == 0 {
            return Err(RepositoryError::NotFound(MSG_NONE_DELETED.to_string()));
        }
        Ok(())
    }

    async fn batch_update_status(&self, owner_id: Uuid, ids: Vec<Uuid>, status: String) -> RepositoryResult<()> {
        if ids.is_empty() {
            return Err(RepositoryError::BadRequest(MSG_NO_IDS.to_string()));
        }
        let now = Utc::now();
        let mut affected = 0;
        for row in self.rows.write().await.iter_mut() {
            if ids.contains(&row.id) && Self::visible(row, owner_id) {
                row.status = Some(status.clone());
                row.updated_at = Some(now);
                affected += 1;
            }
        }
        if affected == 0 {
            return Err(RepositoryError::NotFound(MSG_NONE_UPDATED.to_string()));
        }
        Ok(())
    }
}

/// In-memory `UserStore`; email uniqueness is case-insensitive.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

/// Matches `lower(email)` in postgres, which folds beyond ASCII.
fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new: NewUser) -> RepositoryResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| same_email(&u.email, &new.email)) {
            return Err(RepositoryError::Conflict("Email already exists".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            password_hash: new.password_hash,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.deleted_at.is_none() && same_email(&u.email, email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.deleted_at.is_none() && u.id == id).cloned())
    }
}

/// Router over in-memory stores plus helpers to mint tokens.
pub struct TestContext {
    pub state: AppState,
    pub jwt: JwtKeys,
}

impl TestContext {
    pub fn new() -> Self {
        let mut config = AppConfig::from_env();
        config.security.jwt_secret = TEST_JWT_SECRET.to_string();
        config.filter.max_limit = 50;

        let jwt = JwtKeys::new(TEST_JWT_SECRET, 1);
        let state = AppState {
            applications: ApplicationService::new(Arc::new(MemoryApplicationStore::default())),
            users: UserService::new(Arc::new(MemoryUserStore::default()), jwt.clone()),
            jwt: jwt.clone(),
            config: Arc::new(config),
        };
        Self { state, jwt }
    }

    pub fn router(&self) -> Router {
        app(self.state.clone())
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        self.jwt.issue(user_id, "tester@example.com").expect("issue test token")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
