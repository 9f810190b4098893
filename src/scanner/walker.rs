//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a dataset
//! directory and collecting image files with the metadata the cache
//! validates against (size and modification time).
//!
//! # Features
//!
//! - Flat (root only) or recursive traversal
//! - Case-insensitive extension filtering
//! - Hidden file filtering
//! - Optional symlink following
//! - Deterministic, name-sorted output
//!
//! # Example
//!
//! ```no_run
//! use capdeck::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/data/images"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(image) => println!("{}: {} bytes", image.path.display(), image.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::{DirEntry, WalkDir};

use super::{ImageFile, ScanError, WalkerConfig};

/// Directory walker for image discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    /// Whether an entry below the root is hidden.
    fn is_hidden(entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'))
    }

    /// Walk the directory tree, yielding image entries.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration.
    pub fn walk(&self) -> impl Iterator<Item = Result<ImageFile, ScanError>> + '_ {
        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let skip_hidden = self.config.skip_hidden;

        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !(skip_hidden && Self::is_hidden(entry)))
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => self.process_entry(&entry),
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    Some(Err(self.handle_walkdir_error(path, e)))
                }
            })
    }

    /// Turn a walked entry into an [`ImageFile`] if it is an image.
    fn process_entry(&self, entry: &DirEntry) -> Option<Result<ImageFile, ScanError>> {
        let path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            return None;
        }

        if file_type.is_symlink() && !self.config.follow_symlinks {
            log::trace!("Skipping symlink: {}", path.display());
            return None;
        }

        if !self.config.is_image(path) {
            log::trace!("Skipping non-image: {}", path.display());
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("metadata unavailable"));
                return Some(Err(self.handle_io_error(path, source)));
            }
        };

        if !metadata.is_file() {
            return None;
        }

        Some(Ok(Self::image_from_metadata(path.to_path_buf(), &metadata)))
    }

    fn image_from_metadata(path: PathBuf, metadata: &Metadata) -> ImageFile {
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        ImageFile::new(path, metadata.len(), modified)
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path.to_path_buf())
            }
            ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path.to_path_buf())
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                }
            }
        }
    }

    /// Handle walkdir errors.
    fn handle_walkdir_error(&self, path: PathBuf, error: walkdir::Error) -> ScanError {
        match error.into_io_error() {
            Some(io) => self.handle_io_error(&path, io),
            None => {
                log::warn!("Symlink loop detected at {}", path.display());
                ScanError::Io {
                    path,
                    source: std::io::Error::other("symlink loop"),
                }
            }
        }
    }
}
