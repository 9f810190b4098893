//! Options and results of listing a dataset.

use std::path::{Path, PathBuf};

use crate::cache::{CacheEntry, CacheStore};
use crate::config::Config;
use crate::scanner::SortKey;

/// Where a session keeps its metadata cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLocation {
    /// In memory only; nothing survives the session.
    Memory,
    /// SQLite database at the given path.
    File(PathBuf),
}

impl CacheLocation {
    /// Pick the location from configuration and the `--no-cache` flag.
    ///
    /// Falls back to [`CacheLocation::Memory`] when no platform cache
    /// directory can be determined.
    #[must_use]
    pub fn resolve(config: &Config, no_cache: bool) -> Self {
        if no_cache {
            return Self::Memory;
        }
        match config.cache_path.clone().or_else(CacheStore::default_path) {
            Some(path) => Self::File(path),
            None => {
                log::warn!("No cache directory available, caching in memory only");
                Self::Memory
            }
        }
    }
}

/// How a dataset is listed.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Listing order.
    pub sort: SortKey,
    /// Keep only images whose caption contains this text (case-insensitive).
    pub search: Option<String>,
    /// Descend into subdirectories.
    pub recursive: bool,
}

impl ListOptions {
    /// Options taken from the configured defaults.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            sort: config.sort,
            search: None,
            recursive: config.recursive,
        }
    }

    /// Set the caption search query.
    #[must_use]
    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }
}

/// Images of a dataset, in listing order.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Root directory that was scanned.
    pub root: PathBuf,
    /// Readable images that passed the search filter.
    pub images: Vec<CacheEntry>,
    /// Images that could not be read or decoded, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    /// Image files found by the scan, before filtering.
    pub scanned: usize,
}

impl Listing {
    pub(crate) fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            ..Self::default()
        }
    }

    /// Number of listed images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether no image is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Listed images that have a non-empty caption.
    #[must_use]
    pub fn captioned(&self) -> usize {
        self.images.iter().filter(|e| e.has_caption()).count()
    }

    /// Total size of the listed images in bytes.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.images.iter().map(|e| e.size_bytes).sum()
    }
}
