//! Photos - a chat bot that keeps a rolling photo collection on disk.
//!
//! Trusted users invite the bot into a room and send pictures. Every
//! picture is stored in a media directory, listed in a bounded "recent
//! files" ledger (for a photo frame or slideshow to read) and optionally
//! converted. A text sent right after a picture is burned into it as a
//! caption. When the disk runs low the oldest pictures are evicted.
//!
//! # Architecture
//!
//! - `photos_error` - Error types
//! - `photos_storage` - Media store, ledgers, eviction and converters
//! - `photos_bot` - Configuration, chat transport seam, routing and lifecycle
//!
//! This crate re-exports everything and ships the `photos` binary.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use photos::{BotConfig, MediaStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BotConfig::from_file("photos.toml")?;
//! let store = MediaStore::new(config.storage().clone())?;
//! let stored = store.store(b"jpeg bytes", "holiday.jpg").await?;
//! println!("{}", stored.path.display());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod logging;

pub use logging::{filter_directive, init_logging};

pub use photos_error::*;
pub use photos_storage::*;
pub use photos_bot::*;
