//! File actions module.
//!
//! This module provides functionality for:
//! - Moving and copying images together with their caption sidecars
//! - Safe deletion via trash crate, or permanent deletion
//! - Opening an image in an external application
//!
//! Every action treats an image and its sidecar as one unit: the caption
//! follows the image wherever it goes.
//!
//! ```no_run
//! use capdeck::actions::{transfer_image, TransferMode};
//! use std::path::Path;
//!
//! transfer_image(Path::new("cat.png"), Path::new("keep/"), TransferMode::Copy).unwrap();
//! ```

pub mod delete;
pub mod external;
pub mod transfer;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use delete::{delete_image, DeleteMode};
pub use external::{launch_command, open_with};
pub use transfer::{transfer_image, TransferMode, TransferResult};

/// Error type for file actions.
#[derive(Debug, Error)]
pub enum ActionError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when touching a file.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The destination directory does not exist.
    #[error("destination folder does not exist: {0}")]
    DestinationMissing(PathBuf),

    /// A file with the same name already exists at the destination.
    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// The external application could not be started.
    #[error("could not launch {app}: {source}")]
    LaunchFailed {
        app: String,
        #[source]
        source: io::Error,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ActionError {
    /// Map an I/O error on `path` to the most specific variant.
    pub(crate) fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Outcome of applying one operation to many images.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Images the operation changed.
    pub processed: Vec<PathBuf>,
    /// Images in scope that needed no change.
    pub unchanged: Vec<PathBuf>,
    /// Images that failed, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchResult {
    /// Number of images changed.
    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// Number of failed images.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if every image succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Record a failure and log it.
    pub fn fail(&mut self, path: &Path, error: impl std::fmt::Display) {
        log::error!("{}: {}", path.display(), error);
        self.failures.push((path.to_path_buf(), error.to_string()));
    }

    /// Human-readable summary, e.g. `Moved 3 file(s), 1 failed`.
    #[must_use]
    pub fn summary(&self, verb: &str) -> String {
        let mut line = format!("{} {} file(s)", verb, self.processed_count());
        if !self.unchanged.is_empty() {
            line.push_str(&format!(", {} unchanged", self.unchanged.len()));
        }
        if !self.all_succeeded() {
            line.push_str(&format!(", {} failed", self.failure_count()));
        }
        line
    }
}
