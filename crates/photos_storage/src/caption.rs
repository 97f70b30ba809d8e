//! Caption burn-in for the most recently stored file.

use crate::converter::{Caption, Conversion, Converter};
use crate::ledger::MediaIndex;
use crate::MessageConvertConfig;
use photos_error::PhotosResult;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Prefix marking command messages, which are never used as captions.
pub const COMMAND_PREFIX: char = '!';

/// Writes caption text into the newest entry of the recent ledger.
#[derive(Clone)]
pub struct CaptionWriter {
    index: MediaIndex,
    converter: Arc<dyn Converter>,
    config: MessageConvertConfig,
}

impl std::fmt::Debug for CaptionWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionWriter")
            .field("index", &self.index)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CaptionWriter {
    /// Create a caption writer over `index`.
    pub fn new(
        index: MediaIndex,
        converter: Arc<dyn Converter>,
        config: MessageConvertConfig,
    ) -> Self {
        Self {
            index,
            converter,
            config,
        }
    }

    /// Whether caption writing is switched on.
    pub fn enabled(&self) -> bool {
        *self.config.write_text_messages()
    }

    /// Burn `text` into the latest stored file.
    ///
    /// Returns the captioned path, or `None` when captions are disabled, the
    /// text is blank or a command, or nothing has been stored yet. Converter
    /// failures are logged, not returned.
    #[tracing::instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn handle(&self, text: &str) -> PhotosResult<Option<PathBuf>> {
        if !self.enabled() {
            tracing::debug!("Caption writing disabled");
            return Ok(None);
        }
        if text.trim().is_empty() || text.starts_with(COMMAND_PREFIX) {
            tracing::debug!("Ignoring text that is not a caption");
            return Ok(None);
        }

        let Some(target) = self.index.last_entry().await? else {
            tracing::debug!("No stored file to caption");
            return Ok(None);
        };

        let conversion = Conversion {
            binary: self.config.convert_binary(),
            parameters: self.config.convert_parameters(),
            caption: Some(Caption {
                flag: self.config.convert_text_parameter(),
                text,
            }),
            timeout: (*self.config.timeout_secs()).map(Duration::from_secs),
        };
        self.converter.convert(&target, conversion).await;

        tracing::info!(path = %target.display(), "Captioned latest media file");
        Ok(Some(target))
    }
}
