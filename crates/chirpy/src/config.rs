//! Configuration loading

use anyhow::{Context, Result};
use chirpy_auth::PasswordCost;
use chrono::{TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Secret shipped in the default configuration
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Deployment platform; `dev` enables `/admin/reset`
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub polka: PolkaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_access_token_ttl_secs")]
    pub access_token_ttl_secs: i64,
    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: i64,
    /// Upper bound on each refresh-token storage call
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,
    #[serde(default)]
    pub password: PasswordCost,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_token_ttl_secs: default_access_token_ttl_secs(),
            refresh_token_ttl_days: default_refresh_token_ttl_days(),
            store_timeout_secs: default_store_timeout_secs(),
            password: PasswordCost::default(),
        }
    }
}

impl AuthConfig {
    /// Access-token lifetime, rejected if issuing a token now would overflow
    pub fn access_token_ttl(&self) -> Result<TimeDelta> {
        TimeDelta::try_seconds(self.access_token_ttl_secs)
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .with_context(|| {
                format!(
                    "auth.access_token_ttl_secs out of range: {}",
                    self.access_token_ttl_secs
                )
            })
    }

    /// Refresh-token lifetime, rejected if issuing a token now would overflow
    pub fn refresh_token_ttl(&self) -> Result<TimeDelta> {
        TimeDelta::try_days(self.refresh_token_ttl_days)
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .with_context(|| {
                format!(
                    "auth.refresh_token_ttl_days out of range: {}",
                    self.refresh_token_ttl_days
                )
            })
    }
}

/// Polka webhook configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolkaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Prometheus exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_db_url() -> String {
    "sqlite://./data/chirpy.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_access_token_ttl_secs() -> i64 {
    3600 // 1 hour
}

fn default_refresh_token_ttl_days() -> i64 {
    60
}

fn default_store_timeout_secs() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        // Check if config file exists
        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Filesystem path of the SQLite database, if the URL names one
    pub fn database_file(&self) -> Option<&Path> {
        let rest = self
            .database
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.database.url.strip_prefix("sqlite:"))?;
        let path = rest.split('?').next().unwrap_or(rest);
        if path.is_empty() || path.starts_with(":memory:") {
            return None;
        }
        Some(Path::new(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.access_token_ttl_secs, 3600);
        assert_eq!(config.auth.refresh_token_ttl_days, 60);
        assert_eq!(config.auth.store_timeout_secs, 5);
        assert_eq!(config.auth.password, PasswordCost::default());
        assert!(config.platform.is_empty());
        assert!(config.polka.api_key.is_none());
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
platform = "dev"

[server]
port = 9000

[auth]
jwt_secret = "s3cret"

[auth.password]
memory_kib = 1024

[polka]
api_key = "f271c81ff7084ee5b99a5091b42d486e"

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.platform, "dev");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.auth.password.memory_kib, 1024);
        assert_eq!(
            config.auth.password.iterations,
            PasswordCost::default().iterations
        );
        assert_eq!(
            config.polka.api_key.as_deref(),
            Some("f271c81ff7084ee5b99a5091b42d486e")
        );
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = \"not a number\"").unwrap();

        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_token_ttls() {
        let mut auth = AuthConfig::default();
        assert_eq!(auth.access_token_ttl().unwrap(), TimeDelta::seconds(3600));
        assert_eq!(auth.refresh_token_ttl().unwrap(), TimeDelta::days(60));

        auth.access_token_ttl_secs = i64::MAX;
        auth.refresh_token_ttl_days = i64::MAX;
        assert!(auth.access_token_ttl().is_err());
        assert!(auth.refresh_token_ttl().is_err());

        // Representable as a duration, but past the last representable date
        auth.refresh_token_ttl_days = 1_000_000_000;
        assert!(auth.refresh_token_ttl().is_err());
    }

    #[test]
    fn test_database_file() {
        let mut config = Config::default();
        assert_eq!(config.database_file(), Some(Path::new("./data/chirpy.db")));

        config.database.url = "sqlite:chirpy.db?mode=rwc".to_string();
        assert_eq!(config.database_file(), Some(Path::new("chirpy.db")));

        config.database.url = "sqlite::memory:".to_string();
        assert_eq!(config.database_file(), None);
    }
}
