#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use uuid::Uuid;

use job_tracker_api::auth::hash_password;
use job_tracker_api::config::AppConfig;
use job_tracker_api::database::models::NewUser;
use job_tracker_api::database::{DatabaseManager, PgUserRepository, QueryDeadlines, UserStore};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

/// Postgres URL for live tests. Unset means the suite is skipped.
pub fn test_database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL") {
        Ok(url) if !url.is_empty() => Some(url),
        _ => {
            eprintln!("TEST_DATABASE_URL not set, skipping live database test");
            None
        }
    }
}

/// Connected and migrated pool manager, or `None` when skipped.
pub async fn database() -> Result<Option<DatabaseManager>> {
    let Some(url) = test_database_url() else {
        return Ok(None);
    };

    let mut config = AppConfig::from_env().database;
    config.url = url;
    let database = DatabaseManager::connect(&config).await.context("failed to connect test database")?;
    database.migrate().await.context("failed to migrate test database")?;
    Ok(Some(database))
}

/// Inserts a throwaway user and returns its id.
pub async fn create_user(database: &DatabaseManager) -> Result<Uuid> {
    let users = PgUserRepository::new(database.pool(), QueryDeadlines::default());
    let user = users
        .create(NewUser {
            email: unique_email(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password_hash: hash_password("not-used-here")?,
        })
        .await?;
    Ok(user.id)
}

pub fn unique_email() -> String {
    format!("user_{}@example.com", Uuid::new_v4().simple())
}

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn(database_url: &str) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}/api/v1", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_job-tracker"));
        cmd.arg("serve")
            .env("APP_BIND_HOST", "127.0.0.1")
            .env("APP_PORT", port.to_string())
            .env("DATABASE_URL", database_url)
            .env("DATABASE_RUN_MIGRATIONS", "true")
            .env("JWT_SECRET", TEST_JWT_SECRET)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// Shared server for the test binary, or `None` when skipped.
pub async fn ensure_server() -> Result<Option<&'static TestServer>> {
    let Some(url) = test_database_url() else {
        return Ok(None);
    };
    let server = SERVER.get_or_init(|| TestServer::spawn(&url).expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(Some(server))
}
