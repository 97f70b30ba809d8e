//! Disk-space retention and eviction.
//!
//! When free space on the media filesystem drops below the configured floor,
//! the oldest media files (by modification time) are deleted one at a time
//! until the floor is met or nothing evictable is left. Eviction is best
//! effort: a floor that cannot be reached ends the loop, it never spins.

use crate::ledger::{MediaIndex, RebuildReport};
use crate::scan::MediaDirectory;
use photos_error::{PhotosResult, StorageError, StorageErrorKind};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Reports free space for the filesystem holding a path.
pub trait SpaceProbe: Send + Sync {
    /// Bytes available to unprivileged writers.
    fn available_bytes(&self, path: &Path) -> PhotosResult<u64>;
}

/// Probe backed by `statvfs` (or the platform equivalent).
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSpaceProbe;

impl SpaceProbe for FsSpaceProbe {
    fn available_bytes(&self, path: &Path) -> PhotosResult<u64> {
        fs2::available_space(path).map_err(|e| {
            StorageError::new(StorageErrorKind::DiskSpace(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()
        })
    }
}

/// Deletes files chosen for eviction.
#[async_trait::async_trait]
pub trait FileRemover: Send + Sync {
    /// Remove the file at `path`.
    async fn remove(&self, path: &Path) -> std::io::Result<()>;
}

/// Remover backed by `tokio::fs::remove_file`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

#[async_trait::async_trait]
impl FileRemover for FsRemover {
    async fn remove(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}

/// What an eviction pass did.
#[derive(Debug, Clone, PartialEq)]
pub struct EvictionReport {
    /// Files deleted, oldest first
    pub removed: Vec<PathBuf>,
    /// Free space once the pass ended
    pub free_mb_after: f64,
    /// Whether the floor was reached
    pub satisfied: bool,
}

/// Keeps the media filesystem above its free-space floor.
#[derive(Clone)]
pub struct RetentionEngine {
    directory: MediaDirectory,
    min_free_mb: u64,
    probe: Arc<dyn SpaceProbe>,
    remover: Arc<dyn FileRemover>,
}

impl std::fmt::Debug for RetentionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetentionEngine")
            .field("directory", &self.directory)
            .field("min_free_mb", &self.min_free_mb)
            .finish_non_exhaustive()
    }
}

impl RetentionEngine {
    /// Create an engine for `directory` with a floor of `min_free_mb` (0 disables).
    pub fn new(directory: MediaDirectory, min_free_mb: u64, probe: Arc<dyn SpaceProbe>) -> Self {
        Self {
            directory,
            min_free_mb,
            probe,
            remover: Arc::new(FsRemover),
        }
    }

    /// Replace the remover used to delete evicted files.
    pub fn with_remover(mut self, remover: Arc<dyn FileRemover>) -> Self {
        self.remover = remover;
        self
    }

    /// Configured floor in MB.
    pub fn min_free_mb(&self) -> u64 {
        self.min_free_mb
    }

    /// Free space in MB on the media filesystem.
    pub fn free_space_mb(&self) -> PhotosResult<f64> {
        let bytes = self.probe.available_bytes(self.directory.root())?;
        Ok(bytes as f64 / BYTES_PER_MB)
    }

    /// Free space in GB on the media filesystem.
    pub fn free_space_gb(&self) -> PhotosResult<f64> {
        let bytes = self.probe.available_bytes(self.directory.root())?;
        Ok(bytes as f64 / BYTES_PER_GB)
    }

    fn below_floor(&self, free_mb: f64) -> bool {
        self.min_free_mb > 0 && (self.min_free_mb as f64) > free_mb
    }

    /// Whether the media filesystem is currently under the floor.
    pub fn needs_eviction(&self) -> PhotosResult<bool> {
        if self.min_free_mb == 0 {
            return Ok(false);
        }
        Ok(self.below_floor(self.free_space_mb()?))
    }

    /// Delete oldest files until the floor is met or nothing is left to try.
    ///
    /// A file whose deletion fails is logged and not retried in this pass.
    #[tracing::instrument(
        skip(self),
        fields(root = %self.directory.root().display(), min_free_mb = self.min_free_mb)
    )]
    pub async fn evict_until_healthy(&self) -> PhotosResult<EvictionReport> {
        let mut attempted: HashSet<PathBuf> = HashSet::new();
        let mut removed = Vec::new();

        loop {
            let free_mb = self.free_space_mb()?;
            if !self.below_floor(free_mb) {
                return Ok(EvictionReport {
                    removed,
                    free_mb_after: free_mb,
                    satisfied: true,
                });
            }

            let candidates = self.directory.list_oldest_first().await?;
            let Some(oldest) = candidates
                .into_iter()
                .find(|file| !attempted.contains(&file.path))
            else {
                tracing::warn!(
                    free_mb,
                    removed = removed.len(),
                    "No evictable files left, free space still below floor"
                );
                return Ok(EvictionReport {
                    removed,
                    free_mb_after: free_mb,
                    satisfied: false,
                });
            };

            attempted.insert(oldest.path.clone());
            match self.remover.remove(&oldest.path).await {
                Ok(()) => {
                    tracing::info!(
                        path = %oldest.path.display(),
                        size = oldest.size,
                        free_mb,
                        "Evicted oldest media file"
                    );
                    removed.push(oldest.path);
                }
                Err(e) => {
                    let err = StorageError::new(StorageErrorKind::FileDelete(format!(
                        "{}: {}",
                        oldest.path.display(),
                        e
                    )));
                    tracing::error!(error = %err, "Failed to evict media file");
                }
            }
        }
    }

    /// Run eviction and resynchronise the ledgers if space is short.
    ///
    /// Must complete before the bytes of a new file are written. Returns
    /// `None` when no eviction was needed.
    #[tracing::instrument(skip(self, index))]
    pub async fn enforce_before_write(
        &self,
        index: &MediaIndex,
    ) -> PhotosResult<Option<(EvictionReport, RebuildReport)>> {
        if !self.needs_eviction()? {
            return Ok(None);
        }

        let eviction = self.evict_until_healthy().await?;
        let rebuild = index.rebuild().await?;
        Ok(Some((eviction, rebuild)))
    }
}
