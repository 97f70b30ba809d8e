//! Bot configuration file.
//!
//! One TOML file with `[logging]`, `[matrix]` and `[storage]` sections.
//! It is read and validated once at startup; any error aborts before a
//! single event is handled.

use derive_getters::Getters;
use photos_error::{ConfigError, PhotosError, PhotosResult};
use photos_storage::StorageConfig;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Complete bot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct BotConfig {
    /// Log level and format
    #[serde(default)]
    logging: LoggingConfig,
    /// Chat account, trust and media acceptance rules
    matrix: MatrixConfig,
    /// Media directory, ledgers, retention and converters
    storage: StorageConfig,
}

impl BotConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> PhotosResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PhotosError::from(ConfigError::new(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )))
        })?;

        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> PhotosResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            PhotosError::from(ConfigError::new(format!("Failed to parse config: {}", e)))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section, failing on the first problem.
    pub fn validate(&self) -> PhotosResult<()> {
        self.matrix.validate()?;
        self.storage.validate()
    }
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_level")]
    level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Chat account and media acceptance settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct MatrixConfig {
    /// Account the bot logs in as
    #[serde(deserialize_with = "trimmed")]
    user_id: String,
    /// Account password
    #[serde(deserialize_with = "trimmed")]
    user_password: String,
    /// Device the bot expects the server to report
    #[serde(deserialize_with = "trimmed")]
    device_id: String,
    /// Homeserver URL
    #[serde(deserialize_with = "trimmed")]
    base_url: String,
    /// Crypto/state store location
    #[serde(deserialize_with = "trimmed")]
    database_url: String,
    /// User allowed to run `!` commands
    #[serde(default)]
    #[getter(skip)]
    admin_user: Option<String>,
    /// Users whose invites are accepted
    #[serde(default)]
    trusted_users: Vec<String>,
    /// MIME types accepted for storage
    #[serde(default)]
    allowed_mimetypes: Vec<String>,
    /// Attachments above this size are rejected
    max_download_size_mb: u64,
    /// One of these is sent back after a successful store
    #[serde(default)]
    random_response_messages: Vec<String>,
    /// Connection attempts before giving up
    #[serde(default = "default_connect_retries")]
    connect_retries: usize,
    /// First backoff delay between connection attempts
    #[serde(default = "default_connect_backoff_ms")]
    connect_backoff_ms: u64,
}

fn default_connect_retries() -> usize {
    5
}

fn default_connect_backoff_ms() -> u64 {
    1000
}

impl MatrixConfig {
    /// Admin user, `None` when unset or blank.
    pub fn admin_user(&self) -> Option<&str> {
        self.admin_user
            .as_deref()
            .map(str::trim)
            .filter(|user| !user.is_empty())
    }

    /// Whether `user_id` appears in `trusted_users`.
    pub fn is_trusted_user(&self, user_id: &str) -> bool {
        !user_id.is_empty() && self.trusted_users.iter().any(|u| u.trim() == user_id)
    }

    /// Whether `user_id` is the configured admin.
    pub fn is_admin_user(&self, user_id: &str) -> bool {
        self.admin_user() == Some(user_id)
    }

    /// Whether a MIME type may be stored.
    pub fn is_allowed_mimetype(&self, mimetype: &str) -> bool {
        self.allowed_mimetypes
            .iter()
            .any(|allowed| allowed.trim().eq_ignore_ascii_case(mimetype.trim()))
    }

    /// Whether an attachment of `size_bytes` is over the download limit.
    pub fn max_download_size_exceeded(&self, size_bytes: u64) -> bool {
        (self.max_download_size_mb as f64) < size_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Check required settings.
    pub fn validate(&self) -> PhotosResult<()> {
        require("user_id", &self.user_id)?;
        require("user_password", &self.user_password)?;
        require("device_id", &self.device_id)?;
        require("base_url", &self.base_url)?;
        require("database_url", &self.database_url)?;
        if self.allowed_mimetypes.is_empty() {
            return Err(ConfigError::missing("allowed_mimetypes").into());
        }
        if self.trusted_users.is_empty() {
            tracing::warn!("No trusted users configured, invites will be ignored");
        }
        Ok(())
    }
}

fn require(key: &str, value: &str) -> PhotosResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::empty(key).into());
    }
    Ok(())
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}
