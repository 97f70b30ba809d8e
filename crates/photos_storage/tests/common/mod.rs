//! Shared fixtures for storage tests.

#![allow(dead_code)]

use photos_error::PhotosResult;
use photos_storage::{
    ConvertConfigBuilder, Conversion, Converter, MediaStore, MessageConvertConfigBuilder,
    SpaceProbe, StorageConfig, StorageConfigBuilder,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

pub const MB: u64 = 1024 * 1024;

/// A converter invocation captured by [`RecordingConverter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub path: PathBuf,
    pub binary: String,
    pub args: Vec<String>,
    pub caption: Option<String>,
}

/// Converter that records calls instead of running anything.
#[derive(Debug, Default)]
pub struct RecordingConverter {
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingConverter {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Converter for RecordingConverter {
    async fn convert(&self, path: &Path, conversion: Conversion<'_>) {
        self.calls.lock().unwrap().push(RecordedCall {
            path: path.to_path_buf(),
            binary: conversion.binary.to_string(),
            args: conversion.args(path),
            caption: conversion.caption.map(|c| c.text.to_string()),
        });
    }
}

/// Probe reporting a fixed capacity minus the bytes currently in a directory.
#[derive(Debug)]
pub struct DirectoryCapacityProbe {
    pub directory: PathBuf,
    pub capacity_bytes: u64,
}

impl SpaceProbe for DirectoryCapacityProbe {
    fn available_bytes(&self, _path: &Path) -> PhotosResult<u64> {
        let used: u64 = std::fs::read_dir(&self.directory)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter_map(|e| e.metadata().ok())
                    .filter(|m| m.is_file())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0);
        Ok(self.capacity_bytes.saturating_sub(used))
    }
}

/// Probe with plenty of room.
#[derive(Debug)]
pub struct AmpleProbe;

impl SpaceProbe for AmpleProbe {
    fn available_bytes(&self, _path: &Path) -> PhotosResult<u64> {
        Ok(1024 * 1024 * MB)
    }
}

/// Storage configuration rooted in `temp_dir/media` with ledgers beside the media.
pub fn config_in(temp_dir: &TempDir, max_file_count: usize, min_free_mb: u64) -> StorageConfig {
    let media = temp_dir.path().join("media");
    StorageConfigBuilder::default()
        .media_path(media.clone())
        .media_file(media.join("recent.txt"))
        .complete_media_file(Some(media.join("all.txt")))
        .max_file_count(max_file_count)
        .min_free_disk_space_mb(min_free_mb)
        .convert(
            ConvertConfigBuilder::default()
                .convert_binary("/usr/bin/convert")
                .convert_parameters(vec!["-auto-orient".to_string()])
                .build()
                .unwrap(),
        )
        .message_convert(
            MessageConvertConfigBuilder::default()
                .write_text_messages(true)
                .convert_binary("/usr/bin/convert")
                .convert_text_parameter("-annotate")
                .convert_parameters(vec!["-gravity".to_string(), "south".to_string()])
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

/// Store with a recording converter and unlimited disk space.
pub fn recording_store(config: StorageConfig) -> (MediaStore, Arc<RecordingConverter>) {
    let converter = Arc::new(RecordingConverter::default());
    let store = MediaStore::with_parts(config, converter.clone(), Arc::new(AmpleProbe)).unwrap();
    (store, converter)
}

/// Write `size` bytes to `path` and pin its modification time to `age_secs` after the epoch base.
pub fn seed_file(path: &Path, size: usize, age_secs: u64) {
    std::fs::write(path, vec![0u8; size]).unwrap();
    let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + age_secs);
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}

/// Lines of a ledger file, as written.
pub fn ledger_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
