use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::database::models::application::APPLICATION_COLUMNS;
use crate::database::models::{Application, ApplicationChanges, ApplicationFilter, NewApplication};
use crate::database::query_builder::{QueryBuilder, SqlResult};
use crate::database::repository::{with_deadline, QueryDeadlines, RepositoryError, RepositoryResult};

const TABLE: &str = "applications";

pub const MSG_NOT_FOUND: &str = "Application not found";
pub const MSG_NO_IDS: &str = "No application IDs provided";
pub const MSG_NONE_DELETED: &str = "No applications found to delete";
pub const MSG_NONE_UPDATED: &str = "No applications found to update";

/// Owner-scoped access to application records.
///
/// Every operation only sees rows where `user_id` is the caller and
/// `deleted_at IS NULL`. Missing, foreign and already deleted ids are all
/// reported as `NotFound`.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn health_check(&self) -> RepositoryResult<()>;

    async fn insert(&self, owner_id: Uuid, new: NewApplication) -> RepositoryResult<Uuid>;

    async fn find_by_owner(&self, owner_id: Uuid, filter: ApplicationFilter) -> RepositoryResult<Vec<Application>>;

    /// Writes only the supplied fields plus `updated_at`.
    async fn update_fields(&self, owner_id: Uuid, record_id: Uuid, changes: ApplicationChanges) -> RepositoryResult<()>;

    async fn soft_delete(&self, owner_id: Uuid, record_id: Uuid) -> RepositoryResult<()>;

    /// Succeeds when at least one id matched.
    async fn batch_soft_delete(&self, owner_id: Uuid, ids: Vec<Uuid>) -> RepositoryResult<()>;

    async fn batch_update_status(&self, owner_id: Uuid, ids: Vec<Uuid>, status: String) -> RepositoryResult<()>;
}

#[derive(Clone)]
pub struct PgApplicationRepository {
    pool: PgPool,
    deadlines: QueryDeadlines,
}

impl PgApplicationRepository {
    pub fn new(pool: PgPool, deadlines: QueryDeadlines) -> Self {
        Self { pool, deadlines }
    }

    async fn execute(&self, sql: &SqlResult) -> RepositoryResult<u64> {
        debug!(query = %sql.query, params = sql.params.len(), "Executing statement");
        Ok(sql.query().execute(&self.pool).await?.rows_affected())
    }

    async fn fetch_id(&self, sql: &SqlResult) -> RepositoryResult<Uuid> {
        debug!(query = %sql.query, params = sql.params.len(), "Executing insert");
        let (id,) = sql.query_as::<(Uuid,)>().fetch_one(&self.pool).await?;
        Ok(id)
    }

    async fn fetch_all(&self, sql: &SqlResult) -> RepositoryResult<Vec<Application>> {
        debug!(query = %sql.query, params = sql.params.len(), "Executing select");
        Ok(sql.query_as::<Application>().fetch_all(&self.pool).await?)
    }

    /// The row count is checked before commit; any failure drops the
    /// transaction, which rolls it back.
    async fn update_in_transaction(&self, sql: &SqlResult) -> RepositoryResult<()> {
        debug!(query = %sql.query, params = sql.params.len(), "Executing partial update");
        let mut tx = self.pool.begin().await?;
        let affected = sql.query().execute(&mut *tx).await?.rows_affected();
        if affected == 0 {
            tx.rollback().await?;
            debug!("Partial update matched no visible row");
            return Err(RepositoryError::NotFound(MSG_NOT_FOUND.to_string()));
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationRepository {
    async fn health_check(&self) -> RepositoryResult<()> {
        let ping = async {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map(|_| ())
                .map_err(RepositoryError::from)
        };
        with_deadline("health_check", self.deadlines.read, None, ping).await
    }

    async fn insert(&self, owner_id: Uuid, new: NewApplication) -> RepositoryResult<Uuid> {
        let sql = insert_statement(owner_id, new);
        with_deadline("insert", self.deadlines.write, self.deadlines.slow_threshold, self.fetch_id(&sql)).await
    }

    async fn find_by_owner(&self, owner_id: Uuid, filter: ApplicationFilter) -> RepositoryResult<Vec<Application>> {
        let sql = find_statement(owner_id, filter);
        with_deadline("find_by_owner", self.deadlines.read, self.deadlines.slow_threshold, self.fetch_all(&sql)).await
    }

    async fn update_fields(&self, owner_id: Uuid, record_id: Uuid, changes: ApplicationChanges) -> RepositoryResult<()> {
        let sql = update_statement(owner_id, record_id, changes);
        with_deadline(
            "update_fields",
            self.deadlines.write,
            self.deadlines.slow_threshold,
            self.update_in_transaction(&sql),
        )
        .await
    }

    async fn soft_delete(&self, owner_id: Uuid, record_id: Uuid) -> RepositoryResult<()> {
        let sql = soft_delete_statement(owner_id, record_id);
        let affected =
            with_deadline("soft_delete", self.deadlines.write, self.deadlines.slow_threshold, self.execute(&sql)).await?;
        if affected == 0 {
            debug!(%record_id, "Soft delete matched no visible row");
            return Err(RepositoryError::NotFound(MSG_NOT_FOUND.to_string()));
        }
        Ok(())
    }

    async fn batch_soft_delete(&self, owner_id: Uuid, ids: Vec<Uuid>) -> RepositoryResult<()> {
        if ids.is_empty() {
            return Err(RepositoryError::BadRequest(MSG_NO_IDS.to_string()));
        }
        let requested = ids.len();
        let sql = batch_soft_delete_statement(owner_id, ids);
        let affected = with_deadline(
            "batch_soft_delete",
            self.deadlines.write,
            self.deadlines.slow_threshold,
            self.execute(&sql),
        )
        .await?;
        if affected == 0 {
            return Err(RepositoryError::NotFound(MSG_NONE_DELETED.to_string()));
        }
        debug!(requested, affected, "Batch soft delete");
        Ok(())
    }

    async fn batch_update_status(&self, owner_id: Uuid, ids: Vec<Uuid>, status: String) -> RepositoryResult<()> {
        if ids.is_empty() {
            return Err(RepositoryError::BadRequest(MSG_NO_IDS.to_string()));
        }
        let requested = ids.len();
        let sql = batch_status_statement(owner_id, ids, status);
        let affected = with_deadline(
            "batch_update_status",
            self.deadlines.write,
            self.deadlines.slow_threshold,
            self.execute(&sql),
        )
        .await?;
        if affected == 0 {
            return Err(RepositoryError::NotFound(MSG_NONE_UPDATED.to_string()));
        }
        debug!(requested, affected, "Batch status update");
        Ok(())
    }
}

pub(crate) fn insert_statement(owner_id: Uuid, new: NewApplication) -> SqlResult {
    QueryBuilder::insert(TABLE)
        .value("user_id", owner_id)
        .value("company_name", new.company_name)
        .value("position_title", new.position_title)
        .value("job_url", new.job_url)
        .value("salary_range", new.salary_range)
        .value("location", new.location)
        .value("status", new.status)
        .value("notes", new.notes)
        .value("applied_date", new.applied_date)
        .value_now("created_at")
        .returning("id")
        .build()
}

pub(crate) fn find_statement(owner_id: Uuid, filter: ApplicationFilter) -> SqlResult {
    QueryBuilder::select(TABLE, APPLICATION_COLUMNS)
        .where_eq("user_id", owner_id)
        .where_null("deleted_at")
        .where_eq_if("status", filter.status)
        .order_by("created_at DESC")
        .order_by("id ASC")
        .limit(filter.limit)
        .offset(filter.offset)
        .build()
}

pub(crate) fn update_statement(owner_id: Uuid, record_id: Uuid, changes: ApplicationChanges) -> SqlResult {
    QueryBuilder::update(TABLE)
        .set_now("updated_at")
        .set_if("company_name", changes.company_name)
        .set_if("position_title", changes.position_title)
        .set_if("job_url", changes.job_url)
        .set_if("salary_range", changes.salary_range)
        .set_if("location", changes.location)
        .set_if("status", changes.status)
        .set_if("notes", changes.notes)
        .set_if("applied_date", changes.applied_date)
        .where_eq("id", record_id)
        .where_eq("user_id", owner_id)
        .where_null("deleted_at")
        .build()
}

pub(crate) fn soft_delete_statement(owner_id: Uuid, record_id: Uuid) -> SqlResult {
    QueryBuilder::update(TABLE)
        .set_now("deleted_at")
        .where_eq("id", record_id)
        .where_eq("user_id", owner_id)
        .where_null("deleted_at")
        .build()
}

pub(crate) fn batch_soft_delete_statement(owner_id: Uuid, ids: Vec<Uuid>) -> SqlResult {
    QueryBuilder::update(TABLE)
        .set_now("deleted_at")
        .where_any("id", ids)
        .where_eq("user_id", owner_id)
        .where_null("deleted_at")
        .build()
}

pub(crate) fn batch_status_statement(owner_id: Uuid, ids: Vec<Uuid>, status: String) -> SqlResult {
    QueryBuilder::update(TABLE)
        .set("status", status)
        .set_now("updated_at")
        .where_any("id", ids)
        .where_eq("user_id", owner_id)
        .where_null("deleted_at")
        .build()
}
