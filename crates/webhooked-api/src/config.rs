//! Configuration management for the webhooked service.

use std::{fmt, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";

/// Deployment environment; selects the log format and default verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Human-readable logs at debug level.
    #[default]
    Development,
    /// JSON logs at info level.
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// `DATABASE_URL` and `API_KEY` have no usable default and must be
/// provided by one of the first two sources.
///
/// # Example
///
/// ```no_run
/// use webhooked_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
///
/// println!("Server will bind to {}:{}", config.host, config.port);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Database
    /// PostgreSQL connection URL.
    ///
    /// Environment variable: `DATABASE_URL`
    #[serde(default, alias = "DATABASE_URL")]
    pub database_url: String,
    /// Maximum number of database connections in the pool.
    ///
    /// Environment variable: `DATABASE_MAX_CONNECTIONS`
    #[serde(default = "default_max_connections", alias = "DATABASE_MAX_CONNECTIONS")]
    pub database_max_connections: u32,
    /// Minimum number of connections to maintain in the pool.
    ///
    /// Environment variable: `DATABASE_MIN_CONNECTIONS`
    #[serde(default = "default_min_connections", alias = "DATABASE_MIN_CONNECTIONS")]
    pub database_min_connections: u32,
    /// Database connection acquire timeout in seconds.
    ///
    /// Environment variable: `DATABASE_CONNECTION_TIMEOUT`
    #[serde(default = "default_acquire_timeout", alias = "DATABASE_CONNECTION_TIMEOUT")]
    pub database_connection_timeout: u64,
    /// Database connection idle timeout in seconds.
    ///
    /// Environment variable: `DATABASE_IDLE_TIMEOUT`
    #[serde(default = "default_idle_timeout", alias = "DATABASE_IDLE_TIMEOUT")]
    pub database_idle_timeout: u64,
    /// Maximum lifetime of database connections in seconds.
    ///
    /// Environment variable: `DATABASE_MAX_LIFETIME`
    #[serde(default = "default_max_lifetime", alias = "DATABASE_MAX_LIFETIME")]
    pub database_max_lifetime: u64,

    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // Service
    /// Shared secret required in `x-api-key` to create hooks. Never
    /// serialized.
    ///
    /// Environment variable: `API_KEY`
    #[serde(default, alias = "API_KEY", skip_serializing)]
    pub api_key: String,
    /// Deployment environment.
    ///
    /// Environment variable: `ENVIRONMENT`
    #[serde(default, alias = "ENVIRONMENT")]
    pub environment: Environment,
    /// Name reported in logs.
    ///
    /// Environment variable: `SERVICE_NAME`
    #[serde(default = "default_service_name", alias = "SERVICE_NAME")]
    pub service_name: String,

    // Logging
    /// Log filter directives; the environment default applies when unset.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default, alias = "RUST_LOG", skip_serializing_if = "Option::is_none")]
    pub rust_log: Option<String>,
}

impl Config {
    /// Load configuration from defaults, config file, and environment variable
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns error if a source cannot be parsed or validation fails.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        Self::from_figment(&figment)
    }

    /// Extracts and validates configuration from a prepared figment.
    ///
    /// # Errors
    ///
    /// Returns error if extraction or validation fails.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Parse server socket address from host and port configuration.
    ///
    /// # Errors
    ///
    /// Returns error if host and port do not form a socket address.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Request timeout applied to every HTTP request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Log filter directives: `RUST_LOG` if set, otherwise the environment
    /// default.
    pub fn log_filter(&self) -> String {
        match (&self.rust_log, self.environment) {
            (Some(filter), _) if !filter.trim().is_empty() => filter.clone(),
            (_, Environment::Development) => {
                "info,webhooked=debug,webhooked_api=debug,webhooked_core=debug,tower_http=debug"
                    .to_string()
            },
            (_, Environment::Production) => "info".to_string(),
        }
    }

    /// Get database URL with password masked for logging.
    pub fn database_url_masked(&self) -> String {
        if let Some(at_pos) = self.database_url.find('@') {
            if let Some(colon_pos) = self.database_url[..at_pos].rfind(':') {
                if self.database_url[colon_pos + 1..].starts_with("//") {
                    return self.database_url.clone();
                }
                let mut masked = self.database_url.clone();
                masked.replace_range(colon_pos + 1..at_pos, "***");
                return masked;
            }
        }
        self.database_url.clone()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_empty() {
            anyhow::bail!("DATABASE_URL is required");
        }

        if !(self.database_url.starts_with("postgres://")
            || self.database_url.starts_with("postgresql://"))
        {
            anyhow::bail!("DATABASE_URL must be a postgres:// or postgresql:// URL");
        }

        if self.api_key.trim().is_empty() {
            anyhow::bail!("API_KEY is required");
        }

        if self.service_name.is_empty() {
            anyhow::bail!("service_name must not be empty");
        }

        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.database_max_connections == 0 {
            anyhow::bail!("database max_connections must be greater than 0");
        }

        if self.database_min_connections > self.database_max_connections {
            anyhow::bail!("database min_connections cannot exceed max_connections");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            database_max_connections: default_max_connections(),
            database_min_connections: default_min_connections(),
            database_connection_timeout: default_acquire_timeout(),
            database_idle_timeout: default_idle_timeout(),
            database_max_lifetime: default_max_lifetime(),
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            api_key: String::new(),
            environment: Environment::default(),
            service_name: default_service_name(),
            rust_log: None,
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_max_lifetime() -> u64 {
    1800
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_service_name() -> String {
    "webhooked".to_string()
}
