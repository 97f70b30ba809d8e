//! Error types for the photos media bot.
//!
//! This crate provides the foundation error types used throughout the photos workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use photos_error::{PhotosResult, StorageError, StorageErrorKind};
//!
//! fn write_media() -> PhotosResult<()> {
//!     Err(StorageError::new(StorageErrorKind::FileWrite("disk full".to_string())))?
//! }
//!
//! match write_media() {
//!     Ok(()) => println!("stored"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod convert;
mod error;
mod storage;
mod transport;

pub use config::ConfigError;
pub use convert::{ConvertError, ConvertErrorKind};
pub use error::{PhotosError, PhotosErrorKind, PhotosResult};
pub use storage::{StorageError, StorageErrorKind};
pub use transport::{TransportError, TransportErrorKind};
