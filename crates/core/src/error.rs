//! Error taxonomy for the file store.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("source file does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("source is not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("file not found in storage: {0}")]
    NotIndexed(String),

    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("{name} is {size} bytes, limit is {limit}")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("extension not allowed: {0}")]
    ExtensionNotAllowed(String),

    #[error("path escapes storage root: {}", .0.display())]
    OutsideRoot(PathBuf),

    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no free name left for {0}")]
    NamesExhausted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index error: {0}")]
    Index(#[from] storage::IndexError),

    #[error("storage service is not running")]
    ServiceClosed,
}

impl StorageError {
    /// Input was rejected before anything touched the disk.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidFilename(_)
                | Self::TooLarge { .. }
                | Self::ExtensionNotAllowed(_)
                | Self::OutsideRoot(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SourceNotFound(_) | Self::NotIndexed(_))
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
