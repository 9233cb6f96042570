use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::database::models::{NewUser, User};
use crate::database::repository::{with_deadline, QueryDeadlines, RepositoryError, RepositoryResult};

/// Unique index enforcing case-insensitive email uniqueness.
pub const EMAIL_UNIQUE_INDEX: &str = "idx_users_email_lower";

const USER_COLUMNS: &str = "id, email, first_name, last_name, password_hash, created_at, updated_at, deleted_at";

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new: NewUser) -> RepositoryResult<User>;

    /// Case-insensitive; soft-deleted users are never returned.
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
    deadlines: QueryDeadlines,
}

impl PgUserRepository {
    pub fn new(pool: PgPool, deadlines: QueryDeadlines) -> Self {
        Self { pool, deadlines }
    }

    async fn insert_row(&self, new: &NewUser) -> RepositoryResult<User> {
        let query = format!(
            "INSERT INTO users (email, first_name, last_name, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, now()) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&new.email)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(&new.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(classify_insert_error)
    }

    async fn fetch_optional(&self, query: &str, key: UserKey<'_>) -> RepositoryResult<Option<User>> {
        let q = sqlx::query_as::<_, User>(query);
        let q = match key {
            UserKey::Email(email) => q.bind(email),
            UserKey::Id(id) => q.bind(id),
        };
        Ok(q.fetch_optional(&self.pool).await?)
    }
}

enum UserKey<'a> {
    Email(&'a str),
    Id(Uuid),
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn create(&self, new: NewUser) -> RepositoryResult<User> {
        let user = with_deadline("create_user", self.deadlines.write, self.deadlines.slow_threshold, self.insert_row(&new))
            .await?;
        debug!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let query = format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1) AND deleted_at IS NULL",
            USER_COLUMNS
        );
        with_deadline(
            "find_user_by_email",
            self.deadlines.auth,
            self.deadlines.slow_threshold,
            self.fetch_optional(&query, UserKey::Email(email)),
        )
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL", USER_COLUMNS);
        with_deadline(
            "find_user_by_id",
            self.deadlines.auth,
            self.deadlines.slow_threshold,
            self.fetch_optional(&query, UserKey::Id(id)),
        )
        .await
    }
}

/// Unique violations become `Conflict`; the email index gets its own message.
fn classify_insert_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some(EMAIL_UNIQUE_INDEX) => RepositoryError::Conflict("Email already exists".to_string()),
                _ => RepositoryError::Conflict("duplicated data".to_string()),
            };
        }
    }
    err.into()
}
