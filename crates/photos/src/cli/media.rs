//! Media maintenance command handlers.

use photos::{
    MediaStore, PhotosResult, REREAD_REPLY, StorageConfig, StorageError, StorageErrorKind,
};
use std::path::Path;

/// Store a local file through the media store.
#[tracing::instrument(skip(config))]
pub async fn store_file(
    config: StorageConfig,
    file: &Path,
    name: Option<&str>,
) -> PhotosResult<()> {
    let data = tokio::fs::read(file).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!(
            "{}: {}",
            file.display(),
            e
        )))
    })?;
    let name = match name {
        Some(name) => name.to_string(),
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    };

    let store = MediaStore::new(config)?;
    let stored = store.store(&data, &name).await?;
    if let Some((eviction, _)) = &stored.eviction {
        println!("Evicted {} file(s)", eviction.removed.len());
    }
    println!("{}", stored.path.display());
    Ok(())
}

/// Caption the most recently stored file.
pub async fn caption_latest(config: StorageConfig, text: &str) -> PhotosResult<()> {
    let store = MediaStore::new(config)?;
    match store.caption_writer().handle(text).await? {
        Some(path) => println!("{}", path.display()),
        None => println!("Nothing captioned"),
    }
    Ok(())
}

/// Rebuild both ledgers from the media directory.
pub async fn reread(config: StorageConfig) -> PhotosResult<()> {
    let store = MediaStore::new(config)?;
    let report = store.rebuild_index().await?;
    println!("{} ({} files)", REREAD_REPLY, report.files_found);
    Ok(())
}

/// Print free disk space on the media filesystem.
pub fn stats(config: StorageConfig) -> PhotosResult<()> {
    let store = MediaStore::new(config)?;
    println!(
        "Free disk space (Gb): {:.2}",
        store.retention().free_space_gb()?
    );
    Ok(())
}
