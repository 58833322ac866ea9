//! Server configuration

use std::time::Duration;

use crate::error::BoxError;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Pool size
    pub db_max_connections: u32,
    /// Deadline applied to every service operation
    pub request_timeout: Duration,
    /// Log filter level (overridden by RUST_LOG)
    pub log_level: Option<String>,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Directory for daily rolling log files
    pub log_dir: Option<String>,
}

impl Config {
    /// `DATABASE_URL`, or a URL composed from the `DB_*` variables
    fn database_url() -> Result<String, BoxError> {
        if let Some(url) = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
            return Ok(url);
        }

        let var = |name: &str| -> Result<String, BoxError> {
            std::env::var(name)
                .ok()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| format!("DATABASE_URL or {name} must be set").into())
        };
        let host = var("DB_HOST")?;
        let user = var("DB_USER")?;
        let password = var("DB_PASSWORD")?;
        let name = var("DB_NAME")?;
        let port = std::env::var("DB_PORT").unwrap_or_else(|_| "5432".into());

        Ok(format!("postgres://{user}:{password}@{host}:{port}/{name}"))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Ok(Self {
            database_url: Self::database_url()?,
            http_port: std::env::var("HTTP_PORT")
                .or_else(|_| std::env::var("API_PORT"))
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            request_timeout: Duration::from_millis(
                std::env::var("REQUEST_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30_000),
            ),
            log_level: std::env::var("LOG_LEVEL").ok().filter(|s| !s.is_empty()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
        })
    }
}
