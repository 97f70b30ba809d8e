//! Store orchestration.
//!
//! A store resolves a collision-free target, enforces retention, writes the
//! bytes, optionally converts the file and finally records it in the
//! ledgers, in exactly that order.

use crate::caption::CaptionWriter;
use crate::converter::{CommandConverter, Conversion, Converter};
use crate::ledger::{sibling_partial, MediaIndex, RebuildReport};
use crate::retention::{EvictionReport, FsSpaceProbe, RetentionEngine, SpaceProbe};
use crate::scan::is_partial;
use crate::StorageConfig;
use photos_error::{PhotosResult, StorageError, StorageErrorKind};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Name used when an attachment carries no usable filename.
pub const FALLBACK_FILENAME: &str = "attachment";

/// Result of a successful store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMedia {
    /// Where the file now lives; also the newest recent-ledger entry
    pub path: PathBuf,
    /// Bytes written
    pub size_bytes: usize,
    /// SHA-256 of the payload as received
    pub content_hash: String,
    /// Eviction that ran before the write, if any
    pub eviction: Option<(EvictionReport, RebuildReport)>,
}

/// Rolling media storage.
///
/// Callers must serialize access: two concurrent stores against the same
/// directory can lose ledger updates.
///
/// # Example
///
/// ```rust,no_run
/// use photos_storage::{MediaStore, StorageConfig};
///
/// # async fn example(config: StorageConfig) -> Result<(), Box<dyn std::error::Error>> {
/// let store = MediaStore::new(config)?;
/// let stored = store.store(b"jpeg bytes", "holiday.jpg").await?;
/// println!("saved as {}", stored.path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MediaStore {
    config: StorageConfig,
    index: MediaIndex,
    retention: RetentionEngine,
    converter: Arc<dyn Converter>,
}

impl std::fmt::Debug for MediaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStore")
            .field("config", &self.config)
            .field("index", &self.index)
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

impl MediaStore {
    /// Create a store using the subprocess converter and the real disk probe.
    ///
    /// Creates the media directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the directory
    /// cannot be created.
    pub fn new(config: StorageConfig) -> PhotosResult<Self> {
        Self::with_parts(
            config,
            Arc::new(CommandConverter::new()),
            Arc::new(FsSpaceProbe),
        )
    }

    /// Create a store with explicit converter and free-space probe.
    #[tracing::instrument(skip_all, fields(media_path = %config.media_path().display()))]
    pub fn with_parts(
        config: StorageConfig,
        converter: Arc<dyn Converter>,
        probe: Arc<dyn SpaceProbe>,
    ) -> PhotosResult<Self> {
        config.validate()?;

        std::fs::create_dir_all(config.media_path()).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                config.media_path().display(),
                e
            )))
        })?;

        let index = MediaIndex::from_config(&config);
        let retention = RetentionEngine::new(
            index.directory().clone(),
            *config.min_free_disk_space_mb(),
            probe,
        );

        tracing::info!(
            max_file_count = config.max_file_count(),
            min_free_disk_space_mb = config.min_free_disk_space_mb(),
            convert_on_save = config.convert().convert_on_save(),
            "Created media store"
        );

        Ok(Self {
            config,
            index,
            retention,
            converter,
        })
    }

    /// Storage configuration in use.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// The recent/complete ledgers.
    pub fn index(&self) -> &MediaIndex {
        &self.index
    }

    /// The eviction engine.
    pub fn retention(&self) -> &RetentionEngine {
        &self.retention
    }

    /// Caption handler sharing this store's ledgers and converter.
    pub fn caption_writer(&self) -> CaptionWriter {
        CaptionWriter::new(
            self.index.clone(),
            Arc::clone(&self.converter),
            self.config.message_convert().clone(),
        )
    }

    /// Rebuild both ledgers from the media directory.
    pub async fn rebuild_index(&self) -> PhotosResult<RebuildReport> {
        self.index.rebuild().await
    }

    /// First path under the media directory not taken by any entry.
    ///
    /// `a.jpg` becomes `a#1.jpg`, `a#2.jpg`, ... while taken. The ledger
    /// paths count as taken even before they are first written.
    pub async fn next_available_path(&self, filename: &str) -> PathBuf {
        let root = self.config.media_path();
        let candidate = root.join(filename);
        if !self.is_taken(&candidate).await {
            return candidate;
        }

        let name = Path::new(filename);
        let stem = name
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| filename.to_string());
        let extension = name.extension().map(|e| e.to_string_lossy().to_string());

        let mut counter: u64 = 1;
        loop {
            let disambiguated = match &extension {
                Some(ext) => format!("{}#{}.{}", stem, counter, ext),
                None => format!("{}#{}", stem, counter),
            };
            let candidate = root.join(disambiguated);
            if !self.is_taken(&candidate).await {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Persist `data` under (a disambiguated form of) `desired_filename`.
    ///
    /// # Errors
    ///
    /// Fails if eviction, the write, or the ledger update fails. A failed
    /// write leaves neither a partial file nor a ledger entry behind.
    /// Conversion failures are logged and do not fail the store.
    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    pub async fn store(&self, data: &[u8], desired_filename: &str) -> PhotosResult<StoredMedia> {
        let filename = sanitize_filename(desired_filename);
        let target = self.next_available_path(&filename).await;

        let eviction = self.retention.enforce_before_write(&self.index).await?;

        tracing::trace!(path = %target.display(), "Saving file");
        write_file(&target, data).await?;

        if *self.config.convert().convert_on_save() {
            self.converter
                .convert(&target, self.save_conversion())
                .await;
        }

        self.index.append(&target).await?;

        let content_hash = compute_hash(data);
        tracing::info!(
            path = %target.display(),
            size = data.len(),
            hash = %content_hash,
            evicted = eviction.as_ref().map(|(report, _)| report.removed.len()).unwrap_or(0),
            "Stored media file"
        );

        Ok(StoredMedia {
            path: target,
            size_bytes: data.len(),
            content_hash,
            eviction,
        })
    }

    async fn is_taken(&self, path: &Path) -> bool {
        entry_exists(path).await || self.index.directory().is_excluded(path).await
    }

    fn save_conversion(&self) -> Conversion<'_> {
        let convert = self.config.convert();
        Conversion {
            binary: convert.convert_binary(),
            parameters: convert.convert_parameters(),
            caption: None,
            timeout: (*convert.timeout_secs()).map(Duration::from_secs),
        }
    }
}

/// Reduce a sender-supplied name to a plain file name inside the media directory.
pub fn sanitize_filename(desired: &str) -> String {
    let last = desired
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if last.is_empty() || last == "." || last == ".." {
        return FALLBACK_FILENAME.to_string();
    }
    if is_partial(last) {
        return last.trim_start_matches('.').to_string();
    }
    last.to_string()
}

async fn entry_exists(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}

/// Write to a hidden sibling first, then rename into place.
async fn write_file(target: &Path, data: &[u8]) -> PhotosResult<()> {
    let temp_path = sibling_partial(target);

    if let Err(e) = tokio::fs::write(&temp_path, data).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            temp_path.display(),
            e
        )))
        .into());
    }

    if let Err(e) = tokio::fs::rename(&temp_path, target).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
            "rename {} to {}: {}",
            temp_path.display(),
            target.display(),
            e
        )))
        .into());
    }
    Ok(())
}

/// Compute SHA-256 hash of data.
fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
