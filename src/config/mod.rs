use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub filter: FilterConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; contains credentials, so it never leaves the process.
    #[serde(skip_serializing, default)]
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub auth_timeout_secs: u64,
    pub enable_slow_query_warning: bool,
    pub slow_query_threshold_ms: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub max_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing, default)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("APP_BIND_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("APP_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("APP_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }

        // Database overrides
        self.database.url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            compose_database_url(
                &env_or("DB_USER", "admin"),
                &env_or("DB_PASSWORD", "admin"),
                &env_or("DB_HOST", "localhost"),
                &env_or("DB_PORT", "5432"),
                &env_or("DB_NAME", "app"),
            )
        });
        if let Ok(v) = env::var("DB_MAX_CONNS") {
            match v.parse() {
                Ok(n) => self.database.max_connections = n,
                Err(e) => tracing::warn!(error = %e, "invalid DB_MAX_CONNS, keeping {}", self.database.max_connections),
            }
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_READ_TIMEOUT_SECS") {
            self.database.read_timeout_secs = v.parse().unwrap_or(self.database.read_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_WRITE_TIMEOUT_SECS") {
            self.database.write_timeout_secs = v.parse().unwrap_or(self.database.write_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_AUTH_TIMEOUT_SECS") {
            self.database.auth_timeout_secs = v.parse().unwrap_or(self.database.auth_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_SLOW_QUERY_WARNING") {
            self.database.enable_slow_query_warning = v.parse().unwrap_or(self.database.enable_slow_query_warning);
        }
        if let Ok(v) = env::var("DATABASE_SLOW_QUERY_THRESHOLD_MS") {
            self.database.slow_query_threshold_ms = v.parse().unwrap_or(self.database.slow_query_threshold_ms);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Filter overrides
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().unwrap_or(self.filter.max_limit);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("CORS_ORIGIN") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                max_request_size_bytes: 100 * 1024,
            },
            database: DatabaseConfig {
                url: compose_database_url("admin", "admin", "localhost", "5432", "app"),
                max_connections: 10,
                connection_timeout: 30,
                read_timeout_secs: 20,
                write_timeout_secs: 30,
                auth_timeout_secs: 10,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 100,
                run_migrations: true,
            },
            filter: FilterConfig { max_limit: 1000 },
            security: SecurityConfig {
                jwt_secret: "dev-secret-change-me".to_string(),
                jwt_expiry_hours: 24,
                cors_origins: vec!["*".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                max_request_size_bytes: 100 * 1024,
            },
            database: DatabaseConfig {
                url: compose_database_url("admin", "admin", "localhost", "5432", "app"),
                max_connections: 20,
                connection_timeout: 10,
                read_timeout_secs: 20,
                write_timeout_secs: 30,
                auth_timeout_secs: 10,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 500,
                run_migrations: true,
            },
            filter: FilterConfig { max_limit: 500 },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                cors_origins: vec!["*".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                max_request_size_bytes: 100 * 1024,
            },
            database: DatabaseConfig {
                url: compose_database_url("admin", "admin", "localhost", "5432", "app"),
                max_connections: 50,
                connection_timeout: 5,
                read_timeout_secs: 10,
                write_timeout_secs: 20,
                auth_timeout_secs: 10,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 1000,
                run_migrations: false,
            },
            filter: FilterConfig { max_limit: 100 },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                cors_origins: vec!["*".to_string()],
            },
        }
    }
}

/// Builds a postgres URL from discrete connection settings.
pub fn compose_database_url(user: &str, password: &str, host: &str, port: &str, name: &str) -> String {
    format!("postgres://{}:{}@{}:{}/{}?sslmode=disable", user, password, host, port, name)
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        tracing::debug!(key, "using default value for env");
        default.to_string()
    })
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
