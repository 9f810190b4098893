//! Image deletion using trash crate.
//!
//! # Overview
//!
//! Deleting an image also deletes its caption sidecar:
//! - Move to system trash (default, recoverable)
//! - Permanent deletion (with explicit flag)
//!
//! # Example
//!
//! ```no_run
//! use capdeck::actions::delete::{delete_image, DeleteMode};
//! use std::path::Path;
//!
//! match delete_image(Path::new("/data/blurry.png"), DeleteMode::Trash) {
//!     Ok(removed) => println!("Removed {} file(s)", removed.len()),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use super::ActionError;
use crate::caption::caption_path;

/// How files are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Move to the system trash (recoverable).
    #[default]
    Trash,
    /// Remove from disk. Cannot be undone.
    Permanent,
}

impl DeleteMode {
    /// Pick the mode from a `--permanent` style flag.
    #[must_use]
    pub fn from_permanent(permanent: bool) -> Self {
        if permanent {
            Self::Permanent
        } else {
            Self::Trash
        }
    }
}

/// Delete `image` and, if present, its caption sidecar.
///
/// Returns the paths that were removed, image first.
///
/// # Errors
///
/// - `NotFound` if the image doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `TrashFailed` if the trash operation fails
pub fn delete_image(image: &Path, mode: DeleteMode) -> Result<Vec<PathBuf>, ActionError> {
    fs::metadata(image).map_err(|e| ActionError::from_io(image, e))?;

    let mut removed = Vec::with_capacity(2);
    remove_file(image, mode)?;
    removed.push(image.to_path_buf());

    let sidecar = caption_path(image);
    if sidecar.is_file() {
        remove_file(&sidecar, mode)?;
        removed.push(sidecar);
    }

    Ok(removed)
}

fn remove_file(path: &Path, mode: DeleteMode) -> Result<(), ActionError> {
    match mode {
        DeleteMode::Trash => {
            trash::delete(path).map_err(|e| {
                log::error!("Trash operation failed for {}: {}", path.display(), e);
                ActionError::TrashFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            })?;
            log::info!("Moved to trash: {}", path.display());
        }
        DeleteMode::Permanent => {
            fs::remove_file(path).map_err(|e| {
                log::error!("Permanent delete failed for {}: {}", path.display(), e);
                ActionError::from_io(path, e)
            })?;
            log::info!("Permanently deleted: {}", path.display());
        }
    }
    Ok(())
}
