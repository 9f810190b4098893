//! Errors returned by the metadata cache.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::scanner::ProbeError;

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur while looking up or updating cached metadata.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The image (or its caption) could not be read.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not a valid image.
    #[error("Not a valid image {path}: {source}")]
    Decode {
        /// Image path
        path: PathBuf,
        /// The decoder error
        #[source]
        source: image::ImageError,
    },

    /// Writing a caption sidecar failed.
    #[error("Failed to write caption {path}: {source}")]
    CaptionWrite {
        /// Sidecar path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The persistent store failed.
    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl CacheError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Path the error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. } | Self::Decode { path, .. } | Self::CaptionWrite { path, .. } => {
                Some(path)
            }
            Self::Database(_) => None,
        }
    }

    /// Whether the error means the file is not a decodable image.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

impl From<ProbeError> for CacheError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::Io { path, source } => Self::Io { path, source },
            ProbeError::Decode { path, source } => Self::Decode { path, source },
        }
    }
}
