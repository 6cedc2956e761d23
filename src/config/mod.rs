//! Configuration management
//!
//! This module handles loading and parsing configuration for the EcoPark backend.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Longest accepted session lifetime (ten years)
pub const MAX_SESSION_DAYS: i64 = 3650;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Identity provider and session configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins; `*` mirrors the request origin so cookies still work
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or URL (`:memory:` for an ephemeral store)
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/ecopark.db".to_string()
}

/// Identity provider and session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session-data exchange endpoint of the upstream identity provider
    #[serde(default = "default_provider_url")]
    pub provider_url: String,
    /// Upper bound for a single exchange call
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,
    /// Lifetime of an issued session
    #[serde(default = "default_session_days")]
    pub session_days: i64,
    /// Period of the expired-session sweep
    #[serde(default = "default_session_cleanup_interval_secs")]
    pub session_cleanup_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider_url: default_provider_url(),
            provider_timeout_secs: default_provider_timeout_secs(),
            session_days: default_session_days(),
            session_cleanup_interval_secs: default_session_cleanup_interval_secs(),
        }
    }
}

fn default_provider_url() -> String {
    "https://demobackend.emergentagent.com/auth/v1/env/oauth/session-data".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    10
}

fn default_session_days() -> i64 {
    7
}

fn default_session_cleanup_interval_secs() -> u64 {
    3600
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - ECOPARK_SERVER_HOST
    /// - ECOPARK_SERVER_PORT
    /// - ECOPARK_SERVER_CORS_ORIGINS (comma-separated)
    /// - ECOPARK_DATABASE_URL
    /// - ECOPARK_AUTH_PROVIDER_URL
    /// - ECOPARK_AUTH_PROVIDER_TIMEOUT_SECS
    /// - ECOPARK_AUTH_SESSION_DAYS
    /// - ECOPARK_AUTH_SESSION_CLEANUP_INTERVAL_SECS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the services cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.session_days <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.session_days must be positive".to_string(),
            ));
        }
        if self.auth.session_days > MAX_SESSION_DAYS {
            return Err(ConfigError::ValidationError(format!(
                "auth.session_days must be at most {}",
                MAX_SESSION_DAYS
            )));
        }
        if self.auth.provider_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "auth.provider_timeout_secs must be positive".to_string(),
            ));
        }
        if self.auth.session_cleanup_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "auth.session_cleanup_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("ECOPARK_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("ECOPARK_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(origins) = std::env::var("ECOPARK_SERVER_CORS_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if !origins.is_empty() {
                self.server.cors_origins = origins;
            }
        }

        if let Ok(url) = std::env::var("ECOPARK_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(url) = std::env::var("ECOPARK_AUTH_PROVIDER_URL") {
            self.auth.provider_url = url;
        }
        if let Ok(timeout) = std::env::var("ECOPARK_AUTH_PROVIDER_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.auth.provider_timeout_secs = timeout;
            }
        }
        if let Ok(days) = std::env::var("ECOPARK_AUTH_SESSION_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                self.auth.session_days = days;
            }
        }
        if let Ok(interval) = std::env::var("ECOPARK_AUTH_SESSION_CLEANUP_INTERVAL_SECS") {
            if let Ok(interval) = interval.parse::<u64>() {
                self.auth.session_cleanup_interval_secs = interval;
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test that touches process environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn valid_config_strategy() -> impl Strategy<Value = Config> {
        (
            "[a-z][a-z0-9]{0,10}",
            1u16..=65535,
            "[a-z][a-z0-9_/]{0,20}\\.db",
            1u64..=120,
            1i64..=90,
        )
            .prop_map(|(host, port, url, timeout, days)| Config {
                server: ServerConfig {
                    host,
                    port,
                    cors_origins: vec!["*".to_string()],
                },
                database: DatabaseConfig { url },
                auth: AuthConfig {
                    provider_timeout_secs: timeout,
                    session_days: days,
                    ..AuthConfig::default()
                },
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// A serialized config loads back with the same values
        #[test]
        fn config_yaml_roundtrip(config in valid_config_strategy()) {
            let yaml = serde_yaml::to_string(&config).unwrap();
            let mut file = NamedTempFile::new().unwrap();
            write!(file, "{}", yaml).unwrap();

            let loaded = Config::load(file.path()).unwrap();
            prop_assert_eq!(loaded.server.host, config.server.host);
            prop_assert_eq!(loaded.server.port, config.server.port);
            prop_assert_eq!(loaded.database.url, config.database.url);
            prop_assert_eq!(loaded.auth.provider_timeout_secs, config.auth.provider_timeout_secs);
            prop_assert_eq!(loaded.auth.session_days, config.auth.session_days);
        }
    }
}
