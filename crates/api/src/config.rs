use std::str::FromStr;
use std::time::Duration;

use questy_events::QueueConfig;

use crate::auth::jwt::JwtConfig;

/// Startup configuration failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
///
/// Loaded once at startup and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on draining background work at shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Link target in invitation emails.
    pub public_url: String,
    /// Optional banner image in invitation emails.
    pub invitation_image_url: Option<String>,
    /// Whether sending a quest emails the recipient.
    pub mailing_enabled: bool,
    pub invitation_queue: QueueConfig,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                  |
    /// |-----------------------------|--------------------------|
    /// | `HOST`                      | `0.0.0.0`                |
    /// | `PORT`                      | `3000`                   |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                     |
    /// | `SHUTDOWN_TIMEOUT_SECS`     | `30`                     |
    /// | `PUBLIC_URL`                | `https://questy.fun`     |
    /// | `INVITATION_IMAGE_URL`      | unset                    |
    /// | `MAILING_ENABLED`           | `false`                  |
    /// | `INVITATION_QUEUE_CAPACITY` | `256`                    |
    /// | `INVITATION_MAX_ATTEMPTS`   | `3`                      |
    /// | `INVITATION_RETRY_BASE_MS`  | `500`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = parse_var("PORT", 3000u16)?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", 30u64)?;
        let shutdown_timeout_secs = parse_var("SHUTDOWN_TIMEOUT_SECS", 30u64)?;

        let public_url = std::env::var("PUBLIC_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "https://questy.fun".into());
        let invitation_image_url = std::env::var("INVITATION_IMAGE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let mailing_enabled = parse_var("MAILING_ENABLED", false)?;

        let defaults = QueueConfig::default();
        let invitation_queue = QueueConfig {
            capacity: parse_var("INVITATION_QUEUE_CAPACITY", defaults.capacity)?,
            max_attempts: parse_var("INVITATION_MAX_ATTEMPTS", defaults.max_attempts)?,
            retry_base: Duration::from_millis(parse_var(
                "INVITATION_RETRY_BASE_MS",
                defaults.retry_base.as_millis() as u64,
            )?),
        };

        let jwt = JwtConfig::from_env()?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            public_url,
            invitation_image_url,
            mailing_enabled,
            invitation_queue,
            jwt,
        })
    }
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `DATABASE_URL`             | **yes**  |         |
    /// | `DATABASE_MAX_CONNECTIONS` | no       | `20`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        Ok(Self {
            url,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 20u32)?,
        })
    }
}

/// Read `var`, falling back to `default` when unset.
pub(crate) fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(default),
    }
}
