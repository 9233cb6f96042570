use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::warn;

use crate::config::DatabaseConfig;

/// Outcome classification shared by every store.
///
/// Only empty input, zero affected rows and unique violations are classified;
/// everything else the driver reports is wrapped as `Persistence`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Persistence(err.to_string())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Per-call time limits applied to store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDeadlines {
    pub read: Duration,
    pub write: Duration,
    pub auth: Duration,
    pub slow_threshold: Option<Duration>,
}

impl QueryDeadlines {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            read: Duration::from_secs(config.read_timeout_secs),
            write: Duration::from_secs(config.write_timeout_secs),
            auth: Duration::from_secs(config.auth_timeout_secs),
            slow_threshold: config
                .enable_slow_query_warning
                .then(|| Duration::from_millis(config.slow_query_threshold_ms)),
        }
    }
}

impl Default for QueryDeadlines {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(20),
            write: Duration::from_secs(30),
            auth: Duration::from_secs(10),
            slow_threshold: Some(Duration::from_millis(100)),
        }
    }
}

/// Runs `fut` under `limit`. Expiry surfaces as `Persistence`; calls slower
/// than the configured threshold are logged at WARN.
pub async fn with_deadline<T, F>(
    operation: &'static str,
    limit: Duration,
    slow_threshold: Option<Duration>,
    fut: F,
) -> RepositoryResult<T>
where
    F: Future<Output = RepositoryResult<T>>,
{
    let started = Instant::now();
    let result = match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "Store call exceeded deadline");
            Err(RepositoryError::Persistence(format!(
                "{} timed out after {}ms",
                operation,
                limit.as_millis()
            )))
        }
    };

    let elapsed = started.elapsed();
    if let Some(threshold) = slow_threshold {
        if elapsed > threshold {
            warn!(operation, elapsed_ms = elapsed.as_millis() as u64, "Slow store call");
        }
    }

    result
}
