//! Configuration module
//!
//! The gateway reads a single TOML file (default
//! `~/.config/spam-gateway/config.toml`). Every section and field has a
//! default, so an empty or partial file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Role;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spam-gateway")
        .join("config.toml")
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub dashboard: DashboardConfig,
    pub inference: InferenceConfig,
    #[serde(default = "default_users")]
    pub users: Vec<UserEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// SQLite file holding the event log
    pub path: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: "./spam-gateway.db".to_string(),
        }
    }
}

impl DatabaseSection {
    pub fn connection_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HMAC secret for tokens; empty means a random secret per process
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_minutes: 15,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Predict requests and responses, served by `GET /logs`
    pub request_log_path: String,
    /// Metrics endpoint reads
    pub metrics_log_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            request_log_path: "./logs/app.log".to_string(),
            metrics_log_path: "./logs/metrics.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub bucket_width_secs: i64,
    /// Upper bound for the `width` query parameter
    pub max_bucket_width_secs: i64,
    pub default_bucket_count: usize,
    pub max_bucket_count: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            bucket_width_secs: 60,
            max_bucket_width_secs: 7 * 24 * 3600,
            default_bucket_count: 20,
            max_bucket_count: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub poll_interval_secs: u64,
    pub bucket_count: usize,
    /// Number of counter samples kept for the request-count chart
    pub history_len: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 2,
            bucket_count: 20,
            history_len: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceBackend {
    /// Built-in keyword heuristic
    #[default]
    Keyword,
    /// HTTP model server
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub backend: InferenceBackend,
    /// Model server predict URL, required for the remote backend
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backend: InferenceBackend::Keyword,
            endpoint: None,
            timeout_secs: 10,
        }
    }
}

/// A configured account. Exactly one of `password` / `password_hash` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub role: Role,
}

impl UserEntry {
    pub fn plain(username: &str, password: &str, role: Role) -> Self {
        Self {
            username: username.to_string(),
            password: Some(password.to_string()),
            password_hash: None,
            role,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseSection::default(),
            security: SecurityConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
            dashboard: DashboardConfig::default(),
            inference: InferenceConfig::default(),
            users: default_users(),
        }
    }
}

fn default_users() -> Vec<UserEntry> {
    vec![
        UserEntry::plain("admin", "adminpass", Role::Admin),
        UserEntry::plain("user", "userpass", Role::User),
        UserEntry::plain("normal", "normalpass", Role::Normal),
    ]
}

impl AppConfig {
    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metrics.bucket_width_secs <= 0 {
            return Err(ConfigError::ValidationError(
                "metrics.bucket_width_secs must be positive".to_string(),
            ));
        }
        if self.metrics.bucket_width_secs > self.metrics.max_bucket_width_secs {
            return Err(ConfigError::ValidationError(
                "metrics.bucket_width_secs exceeds metrics.max_bucket_width_secs".to_string(),
            ));
        }
        if self.metrics.default_bucket_count > self.metrics.max_bucket_count {
            return Err(ConfigError::ValidationError(
                "metrics.default_bucket_count exceeds metrics.max_bucket_count".to_string(),
            ));
        }
        if self.security.token_ttl_minutes <= 0 {
            return Err(ConfigError::ValidationError(
                "security.token_ttl_minutes must be positive".to_string(),
            ));
        }
        if self.dashboard.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "dashboard.poll_interval_secs must be positive".to_string(),
            ));
        }
        if self.inference.backend == InferenceBackend::Remote && self.inference.endpoint.is_none() {
            return Err(ConfigError::ValidationError(
                "inference.endpoint is required for the remote backend".to_string(),
            ));
        }
        for user in &self.users {
            if user.password.is_some() == user.password_hash.is_some() {
                return Err(ConfigError::ValidationError(format!(
                    "user '{}' needs exactly one of password / password_hash",
                    user.username
                )));
            }
        }
        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.security.token_ttl_minutes, 15);
        assert_eq!(cfg.metrics.bucket_width_secs, 60);
        assert_eq!(cfg.dashboard.poll_interval_secs, 2);
        assert_eq!(cfg.users.len(), 3);
        assert_eq!(cfg.database.connection_url(), "sqlite://./spam-gateway.db?mode=rwc");
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            port = 9100

            [logging]
            format = "json"

            [[users]]
            username = "ops"
            password = "secret"
            role = "admin"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.users.len(), 1);
        assert_eq!(cfg.users[0].role, Role::Admin);
    }

    #[test]
    fn zero_bucket_width_is_rejected() {
        let err = AppConfig::from_toml("[metrics]\nbucket_width_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn default_width_above_maximum_is_rejected() {
        let err = AppConfig::from_toml(
            "[metrics]\nbucket_width_secs = 7200\nmax_bucket_width_secs = 3600",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn remote_backend_requires_endpoint() {
        let err = AppConfig::from_toml("[inference]\nbackend = \"remote\"").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn user_needs_exactly_one_secret() {
        let err = AppConfig::from_toml(
            "[[users]]\nusername = \"x\"\nrole = \"user\"",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
