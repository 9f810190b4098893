//! Scanner module for dataset discovery and image probing.
//!
//! This module provides functionality for:
//! - Directory walking restricted to image files
//! - Dataset ordering (name, modification time, size)
//! - Image probing (decode, dimensions, thumbnail)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and image discovery
//! - [`probe`]: Decoding a single image into cacheable attributes
//!
//! # Example
//!
//! ```no_run
//! use capdeck::scanner::{Dataset, SortKey, WalkerConfig};
//! use std::path::Path;
//!
//! let mut dataset = Dataset::scan(Path::new("."), WalkerConfig::default()).unwrap();
//! dataset.sort(SortKey::Modified);
//! for image in dataset.images() {
//!     println!("{}: {} bytes", image.path.display(), image.size);
//! }
//! ```

pub mod probe;
pub mod walker;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use probe::{probe_image, ImageProbe, ProbeError};
pub use walker::Walker;

/// Image extensions recognised when no configuration overrides them.
pub const DEFAULT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// A discovered image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Path to the image
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

impl ImageFile {
    /// Create a new ImageFile.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            modified,
        }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Descend into subdirectories. Only the root is listed otherwise.
    pub recursive: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Lowercase file extensions (without the dot) treated as images.
    pub extensions: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            skip_hidden: false,
            follow_symlinks: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl WalkerConfig {
    /// Check whether a path carries one of the configured image extensions.
    ///
    /// Matching is case-insensitive, so `photo.JPG` is an image.
    #[must_use]
    pub fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

/// Ordering applied to a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// File path, ascending
    #[default]
    Name,
    /// Modification time, newest first
    Modified,
    /// File size, largest first
    Size,
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortKey::Name => write!(f, "name"),
            SortKey::Modified => write!(f, "modified"),
            SortKey::Size => write!(f, "size"),
        }
    }
}

/// An ordered sequence of images discovered under a root directory.
///
/// A dataset is a snapshot: it is recomputed on every scan and never updated
/// in place when files change.
#[derive(Debug, Clone)]
pub struct Dataset {
    root: PathBuf,
    images: Vec<ImageFile>,
}

impl Dataset {
    /// Scan `root` for images.
    ///
    /// Unreadable entries are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] or [`ScanError::NotADirectory`] when
    /// the root itself is unusable.
    pub fn scan(root: &Path, config: WalkerConfig) -> Result<Self, ScanError> {
        if !root.exists() {
            return Err(ScanError::NotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let walker = Walker::new(root, config);
        let mut images = Vec::new();
        for entry in walker.walk() {
            match entry {
                Ok(image) => images.push(image),
                Err(e) => log::warn!("Skipping entry: {}", e),
            }
        }

        log::debug!("Found {} image(s) under {}", images.len(), root.display());

        Ok(Self {
            root: root.to_path_buf(),
            images,
        })
    }

    /// Build a dataset from already discovered images.
    #[must_use]
    pub fn from_images(root: PathBuf, images: Vec<ImageFile>) -> Self {
        Self { root, images }
    }

    /// Reorder the dataset. Ties are broken by path so the order is stable.
    pub fn sort(&mut self, key: SortKey) {
        match key {
            SortKey::Name => self.images.sort_by(|a, b| a.path.cmp(&b.path)),
            SortKey::Modified => self.images.sort_by(|a, b| {
                b.modified
                    .cmp(&a.modified)
                    .then_with(|| a.path.cmp(&b.path))
            }),
            SortKey::Size => self
                .images
                .sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path))),
        }
    }

    /// Root directory that was scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Images in their current order.
    #[must_use]
    pub fn images(&self) -> &[ImageFile] {
        &self.images
    }

    /// Paths in their current order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.images.iter().map(|i| i.path.as_path())
    }

    /// Number of images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the dataset holds no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
