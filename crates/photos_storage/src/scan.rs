//! Media directory listing.
//!
//! The files on disk are the ground truth for eviction and ledger rebuilds.
//! Ledger files that live inside the media directory are excluded by exact
//! path, never by extension, so a user's `notes.txt` is still a stored file.

use photos_error::{PhotosResult, StorageError, StorageErrorKind};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Suffix of the hidden files used while a store is in flight.
pub(crate) const PARTIAL_SUFFIX: &str = ".partial";

/// A regular file in the media directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Path as used in the ledgers (`media_path` joined with the file name)
    pub path: PathBuf,
    /// Last modification time, the recency signal
    pub modified: SystemTime,
    /// Size in bytes
    pub size: u64,
}

/// View over the media directory that knows which entries are not media.
#[derive(Debug, Clone)]
pub struct MediaDirectory {
    root: PathBuf,
    excluded: Vec<PathBuf>,
}

impl MediaDirectory {
    /// Create a view over `root`, ignoring the given ledger paths.
    pub fn new(root: impl Into<PathBuf>, excluded: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded: excluded.into_iter().collect(),
        }
    }

    /// Directory being listed.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All media files, oldest first.
    ///
    /// Ties on modification time are broken by path so repeated listings of
    /// an unchanged directory are identical.
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn list_oldest_first(&self) -> PhotosResult<Vec<MediaFile>> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                self.root.display(),
                e
            )))
        })?;

        let excluded = self.excluded_identities().await;
        let mut files = Vec::new();

        loop {
            let entry = entries.next_entry().await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    self.root.display(),
                    e
                )))
            })?;
            let Some(entry) = entry else {
                break;
            };

            let name = entry.file_name();
            if is_partial(&name.to_string_lossy()) {
                continue;
            }

            let path = self.root.join(&name);
            // Vanished between listing and stat: not a stored file anymore
            let Ok(metadata) = tokio::fs::metadata(&path).await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            if excluded.contains(&identity(&path).await) {
                continue;
            }

            files.push(MediaFile {
                path,
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                size: metadata.len(),
            });
        }

        files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
        tracing::debug!(count = files.len(), "Listed media files");
        Ok(files)
    }

    /// Whether `path` names one of the excluded ledger files.
    ///
    /// Works before either file exists, so a store can avoid claiming a
    /// ledger's name.
    pub async fn is_excluded(&self, path: &Path) -> bool {
        let target = identity(path).await;
        self.excluded_identities().await.contains(&target)
    }

    async fn excluded_identities(&self) -> Vec<PathBuf> {
        let mut identities = Vec::with_capacity(self.excluded.len());
        for path in &self.excluded {
            identities.push(identity(path).await);
        }
        identities
    }
}

/// Canonical form of a path.
///
/// A file that doesn't exist yet resolves through its parent directory.
/// Falls back to the path itself when neither can be resolved.
async fn identity(path: &Path) -> PathBuf {
    if let Ok(canonical) = tokio::fs::canonicalize(path).await {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => tokio::fs::canonicalize(parent)
            .await
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

pub(crate) fn is_partial(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(PARTIAL_SUFFIX)
}
