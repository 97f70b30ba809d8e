//! Top-level error wrapper types.

use crate::{ConfigError, ConvertError, StorageError, TransportError};

/// Every error condition the photos crates can surface.
///
/// # Examples
///
/// ```
/// use photos_error::{ConfigError, PhotosError};
///
/// let err: PhotosError = ConfigError::new("Missing config entry: media_path").into();
/// assert!(format!("{}", err).contains("media_path"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum PhotosErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Media storage, ledger, or eviction error
    #[from(StorageError)]
    Storage(StorageError),
    /// External converter error
    #[from(ConvertError)]
    Convert(ConvertError),
    /// Chat transport error
    #[from(TransportError)]
    Transport(TransportError),
}

/// Photos error with kind discrimination.
///
/// # Examples
///
/// ```
/// use photos_error::{PhotosErrorKind, PhotosResult, StorageError, StorageErrorKind};
///
/// fn might_fail() -> PhotosResult<()> {
///     Err(StorageError::new(StorageErrorKind::FileRead("a.jpg".to_string())))?
/// }
///
/// let err = might_fail().unwrap_err();
/// assert!(matches!(err.kind(), PhotosErrorKind::Storage(_)));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Photos Error: {}", _0)]
pub struct PhotosError(Box<PhotosErrorKind>);

impl PhotosError {
    /// Create a new error from a kind.
    pub fn new(kind: PhotosErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &PhotosErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to PhotosErrorKind
impl<T> From<T> for PhotosError
where
    T: Into<PhotosErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for photos operations.
pub type PhotosResult<T> = std::result::Result<T, PhotosError>;
