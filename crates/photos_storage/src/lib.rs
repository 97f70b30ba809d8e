//! Rolling media storage for the photos bot.
//!
//! This crate decides where a received file goes, keeps a bounded "recent
//! files" ledger in sync with the media directory, evicts the oldest files
//! when disk space runs low, and runs external conversion tools on stored
//! files.
//!
//! # Features
//!
//! - **Collision-free names**: `a.jpg`, `a#1.jpg`, `a#2.jpg`, ...
//! - **Bounded ledger**: the recent ledger never exceeds `max_file_count` lines
//! - **Complete history**: optional append-only ledger of everything stored
//! - **Free-space floor**: oldest-first eviction followed by a ledger rebuild
//! - **Post-processing**: in-place conversion on save and caption burn-in
//!
//! # Example
//!
//! ```rust,no_run
//! use photos_storage::{MediaStore, StorageConfig};
//!
//! # async fn example(config: StorageConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let store = MediaStore::new(config)?;
//!
//! // Store an attachment
//! let stored = store.store(b"jpeg bytes", "holiday.jpg").await?;
//! assert_eq!(store.index().last_entry().await?, Some(stored.path));
//!
//! // Burn a caption into it
//! store.caption_writer().handle("Happy holidays").await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod caption;
mod config;
mod converter;
mod ledger;
mod retention;
mod scan;
mod strategy;

pub use caption::{CaptionWriter, COMMAND_PREFIX};
pub use config::{
    ConvertConfig, ConvertConfigBuilder, MessageConvertConfig, MessageConvertConfigBuilder,
    StorageConfig, StorageConfigBuilder,
};
pub use converter::{Caption, CommandConverter, Conversion, Converter};
pub use ledger::{MediaIndex, RebuildReport};
pub use retention::{
    EvictionReport, FileRemover, FsRemover, FsSpaceProbe, RetentionEngine, SpaceProbe,
};
pub use scan::{MediaDirectory, MediaFile};
pub use strategy::{sanitize_filename, MediaStore, StoredMedia, FALLBACK_FILENAME};

pub use photos_error::{StorageError, StorageErrorKind};
