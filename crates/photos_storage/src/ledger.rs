//! Recent and complete media ledgers.
//!
//! Both ledgers are UTF-8 text files holding one stored path per line,
//! oldest first. The recent ledger is capped at `max_file_count` lines; the
//! optional complete ledger only ever grows, except when it is rebuilt from
//! the media directory.

use crate::scan::{MediaDirectory, PARTIAL_SUFFIX};
use crate::StorageConfig;
use photos_error::{PhotosResult, StorageError, StorageErrorKind};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Outcome of a ledger rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    /// Media files found on disk
    pub files_found: usize,
    /// Lines written to the recent ledger
    pub recent_entries: usize,
}

/// The "recent files" index plus the optional complete history.
#[derive(Debug, Clone)]
pub struct MediaIndex {
    directory: MediaDirectory,
    recent: PathBuf,
    complete: Option<PathBuf>,
    max_entries: usize,
}

impl MediaIndex {
    /// Create an index over `directory` writing to the given ledger files.
    pub fn new(
        directory: MediaDirectory,
        recent: impl Into<PathBuf>,
        complete: Option<PathBuf>,
        max_entries: usize,
    ) -> Self {
        Self {
            directory,
            recent: recent.into(),
            complete,
            max_entries,
        }
    }

    /// Build the index described by a storage configuration.
    pub fn from_config(config: &StorageConfig) -> Self {
        let ledgers = std::iter::once(config.media_file().clone())
            .chain(config.complete_media_file().clone());
        let directory = MediaDirectory::new(config.media_path().clone(), ledgers);
        Self::new(
            directory,
            config.media_file().clone(),
            config.complete_media_file().clone(),
            *config.max_file_count(),
        )
    }

    /// Path of the recent ledger.
    pub fn recent_path(&self) -> &Path {
        &self.recent
    }

    /// Path of the complete ledger, if enabled.
    pub fn complete_path(&self) -> Option<&Path> {
        self.complete.as_deref()
    }

    /// The media directory this index describes.
    pub fn directory(&self) -> &MediaDirectory {
        &self.directory
    }

    /// Entries of the recent ledger, oldest first. A missing ledger is empty.
    pub async fn recent_entries(&self) -> PhotosResult<Vec<String>> {
        read_lines(&self.recent).await
    }

    /// Entries of the complete ledger. Empty when disabled or missing.
    pub async fn complete_entries(&self) -> PhotosResult<Vec<String>> {
        match &self.complete {
            Some(path) => read_lines(path).await,
            None => Ok(Vec::new()),
        }
    }

    /// Record a newly stored file as the newest entry.
    ///
    /// The recent ledger is rewritten keeping only the last `max_entries`
    /// lines; the complete ledger is appended to and never truncated.
    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    pub async fn append(&self, path: &Path) -> PhotosResult<()> {
        let mut entries = self.recent_entries().await?;
        entries.push(path.to_string_lossy().to_string());
        let keep_from = entries.len().saturating_sub(self.max_entries);
        write_lines(&self.recent, &entries[keep_from..]).await?;

        if let Some(complete) = &self.complete {
            append_line(complete, &path.to_string_lossy()).await?;
        }

        tracing::debug!(
            recent_entries = entries.len() - keep_from,
            "Appended to media ledgers"
        );
        Ok(())
    }

    /// Rewrite both ledgers from the files currently on disk.
    #[tracing::instrument(skip(self), fields(root = %self.directory.root().display()))]
    pub async fn rebuild(&self) -> PhotosResult<RebuildReport> {
        let files = self.directory.list_oldest_first().await?;
        let all: Vec<String> = files
            .iter()
            .map(|file| file.path.to_string_lossy().to_string())
            .collect();

        let keep_from = all.len().saturating_sub(self.max_entries);
        write_lines(&self.recent, &all[keep_from..]).await?;
        if let Some(complete) = &self.complete {
            write_lines(complete, &all).await?;
        }

        let report = RebuildReport {
            files_found: all.len(),
            recent_entries: all.len() - keep_from,
        };
        tracing::info!(
            files_found = report.files_found,
            recent_entries = report.recent_entries,
            "Rebuilt media ledgers"
        );
        Ok(report)
    }

    /// The newest entry of the recent ledger, `None` if it is missing or empty.
    pub async fn last_entry(&self) -> PhotosResult<Option<PathBuf>> {
        let entries = self.recent_entries().await?;
        Ok(entries.last().map(|line| PathBuf::from(line.trim_end())))
    }
}

async fn read_lines(path: &Path) -> PhotosResult<Vec<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(StorageError::new(StorageErrorKind::FileRead(format!(
            "{}: {}",
            path.display(),
            e
        )))
        .into()),
    }
}

/// Replace the whole file, going through a hidden sibling and a rename.
async fn write_lines(path: &Path, lines: &[String]) -> PhotosResult<()> {
    ensure_parent(path).await?;

    let mut content = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }

    let temp_path = sibling_partial(path);
    tokio::fs::write(&temp_path, content).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            temp_path.display(),
            e
        )))
    })?;

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
            "rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        )))
        .into());
    }
    Ok(())
}

async fn append_line(path: &Path, line: &str) -> PhotosResult<()> {
    ensure_parent(path).await?;

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;

    file.write_all(format!("{}\n", line).as_bytes())
        .await
        .map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
    file.flush().await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            path.display(),
            e
        )))
    })?;
    Ok(())
}

async fn ensure_parent(path: &Path) -> PhotosResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                parent.display(),
                e
            )))
        })?;
    }
    Ok(())
}

/// `dir/.name.partial` for `dir/name`.
pub(crate) fn sibling_partial(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}{}", name, PARTIAL_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_partial_is_hidden() {
        let partial = sibling_partial(Path::new("/media/recent.txt"));
        assert_eq!(partial, PathBuf::from("/media/.recent.txt.partial"));
    }
}
