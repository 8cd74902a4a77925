//! Configuration management for fintrack
//!
//! This module handles loading, validation, and management of
//! fintrack configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8081
}

/// Remote records API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the records service (no trailing slash needed)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://personalfinancetracker-server-1.onrender.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Session handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session marker
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Session lifetime in minutes
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,
    /// Accept the literal "true" marker without a token.
    /// Only meant for single-user setups behind another gate.
    #[serde(default)]
    pub trust_flag: bool,
    /// User bound to flag-only sessions
    #[serde(default)]
    pub fallback_user: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_minutes: default_ttl_minutes(),
            trust_flag: false,
            fallback_user: None,
        }
    }
}

fn default_cookie_name() -> String {
    "signed".to_string()
}

/// Longest accepted session lifetime: one year
pub const MAX_TTL_MINUTES: u64 = 365 * 24 * 60;

fn default_ttl_minutes() -> u64 {
    12 * 60
}

/// A user allowed to sign in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password: String,
    /// Identifier sent to the records API; defaults to the username
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl UserConfig {
    /// Identifier used as the records owner
    pub fn effective_user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(&self.username)
    }

    /// Name shown in the navigation bar
    pub fn effective_display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// Sign-in configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote records API
    #[serde(default)]
    pub api: ApiConfig,
    /// Session settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Users allowed to sign in
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::IoError {
                message: e.to_string(),
            })?;

        Self::from_yaml(&content)
    }

    /// Load from a file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path.to_path_buf()) {
            Err(ConfigError::FileNotFound { path }) => {
                log::warn!("Config file {} not found, using defaults", path);
                let config = Config::default();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Parse and validate YAML content
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::InvalidYaml {
                message: e.to_string(),
            })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "api.base_url".to_string(),
            });
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                reason: "Base URL must start with http:// or https://".to_string(),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".to_string(),
                reason: "Timeout must be at least one second".to_string(),
            });
        }

        if self.session.ttl_minutes == 0 || self.session.ttl_minutes > MAX_TTL_MINUTES {
            return Err(ConfigError::InvalidValue {
                field: "session.ttl_minutes".to_string(),
                reason: format!("Session lifetime must be between 1 and {} minutes", MAX_TTL_MINUTES),
            });
        }

        if self.session.cookie_name.is_empty()
            || self.session.cookie_name.contains(|c: char| c == ';' || c == '=' || c.is_whitespace())
        {
            return Err(ConfigError::InvalidValue {
                field: "session.cookie_name".to_string(),
                reason: "Cookie name must be a non-empty token".to_string(),
            });
        }

        if self.session.trust_flag && self.session.fallback_user.is_none() {
            return Err(ConfigError::ValidationError {
                message: "session.trust_flag requires session.fallback_user".to_string(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for user in &self.auth.users {
            if user.username.is_empty() {
                return Err(ConfigError::MissingField {
                    field: "auth.users[].username".to_string(),
                });
            }
            if !seen.insert(user.username.as_str()) {
                return Err(ConfigError::ValidationError {
                    message: format!("Duplicate user: {}", user.username),
                });
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Expected one of {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Base URL without a trailing slash
    pub fn api_base_url(&self) -> &str {
        self.api.base_url.trim().trim_end_matches('/')
    }

    /// Look up a configured user by name
    pub fn find_user(&self, username: &str) -> Option<&UserConfig> {
        self.auth.users.iter().find(|u| u.username == username)
    }
}

// ==================== Tests ====================
