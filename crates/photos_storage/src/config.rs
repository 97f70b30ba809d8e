//! Storage configuration types.
//!
//! These are the `[storage]` tables of the bot configuration file. They are
//! deserialized once at startup and validated before any media is handled.

use derive_getters::Getters;
use photos_error::{ConfigError, PhotosResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Settings for the conversion run on every stored file.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(setter(into))]
pub struct ConvertConfig {
    /// Run the converter right after a file is written
    #[serde(default)]
    #[builder(default)]
    convert_on_save: bool,

    /// Path of the conversion tool
    #[serde(deserialize_with = "trimmed")]
    convert_binary: String,

    /// Positional arguments placed before the file paths
    #[serde(default)]
    #[builder(default)]
    convert_parameters: Vec<String>,

    /// Kill the tool after this many seconds (waits forever when unset)
    #[serde(default)]
    #[builder(default)]
    timeout_secs: Option<u64>,
}

/// Settings for burning text messages into the latest stored file.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(setter(into))]
pub struct MessageConvertConfig {
    /// Whether captions are written at all
    #[serde(default)]
    #[builder(default)]
    write_text_messages: bool,

    /// Path of the conversion tool
    #[serde(deserialize_with = "trimmed")]
    convert_binary: String,

    /// Flag token preceding the caption text (e.g. `-annotate`)
    #[serde(deserialize_with = "trimmed")]
    convert_text_parameter: String,

    /// Positional arguments placed before the caption
    #[serde(default)]
    #[builder(default)]
    convert_parameters: Vec<String>,

    /// Kill the tool after this many seconds (waits forever when unset)
    #[serde(default)]
    #[builder(default)]
    timeout_secs: Option<u64>,
}

/// Media directory, ledgers and retention limits.
///
/// # Example
///
/// ```
/// use photos_storage::{ConvertConfigBuilder, MessageConvertConfigBuilder, StorageConfigBuilder};
///
/// let config = StorageConfigBuilder::default()
///     .media_path("/var/lib/photos/media")
///     .media_file("/var/lib/photos/media/recent.txt")
///     .max_file_count(100usize)
///     .convert(
///         ConvertConfigBuilder::default()
///             .convert_binary("/usr/bin/convert")
///             .build()
///             .unwrap(),
///     )
///     .message_convert(
///         MessageConvertConfigBuilder::default()
///             .convert_binary("/usr/bin/convert")
///             .convert_text_parameter("-annotate")
///             .build()
///             .unwrap(),
///     )
///     .build()
///     .unwrap();
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(setter(into))]
pub struct StorageConfig {
    /// Directory receiving the media files
    #[serde(deserialize_with = "trimmed_path")]
    media_path: PathBuf,

    /// Recent ledger file
    #[serde(deserialize_with = "trimmed_path")]
    media_file: PathBuf,

    /// Complete ledger file, disabled when unset
    #[serde(default, deserialize_with = "trimmed_optional_path")]
    #[builder(default)]
    complete_media_file: Option<PathBuf>,

    /// Maximum number of entries in the recent ledger
    max_file_count: usize,

    /// Free disk space floor in MB, 0 disables eviction
    #[serde(default)]
    #[builder(default)]
    min_free_disk_space_mb: u64,

    /// Conversion applied on save
    convert: ConvertConfig,

    /// Caption conversion
    message_convert: MessageConvertConfig,
}

impl StorageConfig {
    /// Check required settings, failing on the first missing or blank one.
    pub fn validate(&self) -> PhotosResult<()> {
        require_path("media_path", &self.media_path)?;
        require_path("media_file", &self.media_file)?;
        if let Some(complete) = &self.complete_media_file {
            require_path("complete_media_file", complete)?;
        }
        if self.max_file_count == 0 {
            return Err(ConfigError::new("max_file_count must be greater than 0").into());
        }
        require_str("convert.convert_binary", &self.convert.convert_binary)?;
        require_str(
            "message_convert.convert_binary",
            &self.message_convert.convert_binary,
        )?;
        require_str(
            "message_convert.convert_text_parameter",
            &self.message_convert.convert_text_parameter,
        )?;
        Ok(())
    }

    /// Whether the free-space floor is active.
    pub fn eviction_enabled(&self) -> bool {
        self.min_free_disk_space_mb > 0
    }
}

fn require_str(key: &str, value: &str) -> PhotosResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::empty(key).into());
    }
    Ok(())
}

fn require_path(key: &str, value: &Path) -> PhotosResult<()> {
    require_str(key, &value.to_string_lossy())
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

fn trimmed_path<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    trimmed(deserializer).map(PathBuf::from)
}

fn trimmed_optional_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|v| PathBuf::from(v.trim())))
}
