//! Session: the explicit owner of the metadata cache.
//!
//! A [`Session`] is opened once per run with [`Session::open`] and torn down
//! with [`Session::close`], which closes the SQLite store. Everything that
//! reads image metadata or changes files on disk goes through it so that the
//! cache is kept consistent with the filesystem.
//!
//! # Architecture
//!
//! * [`listing`]: [`ListOptions`], [`Listing`] and [`CacheLocation`].
//!
//! # Example
//!
//! ```no_run
//! use capdeck::config::Config;
//! use capdeck::session::{CacheLocation, ListOptions, Session};
//! use std::path::Path;
//!
//! let config = Config::default();
//! let options = ListOptions::from_config(&config);
//! let mut session = Session::open(config, CacheLocation::Memory).unwrap();
//! let listing = session.list(Path::new("dataset"), &options, None).unwrap();
//! println!("{} images", listing.len());
//! session.close().unwrap();
//! ```

pub mod listing;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::actions::{self, ActionError, BatchResult, DeleteMode, TransferMode};
use crate::cache::{cache_key, CacheEntry, CacheResult, CacheStore, MetadataCache};
use crate::caption::{self, CaptionEdit, Scope};
use crate::config::Config;
use crate::progress::{ProgressCallback, PHASE_PROBING, PHASE_SCANNING};
use crate::scanner::{Dataset, ScanError};

pub use listing::{CacheLocation, ListOptions, Listing};

/// One run of the application: configuration, cache and selection.
#[derive(Debug)]
pub struct Session {
    config: Config,
    cache: MetadataCache,
    selection: BTreeSet<PathBuf>,
}

impl Session {
    /// Open a session, creating its cache at `location`.
    ///
    /// # Errors
    ///
    /// Returns a database error if the cache file cannot be opened or is not
    /// a capdeck database.
    pub fn open(config: Config, location: CacheLocation) -> CacheResult<Self> {
        let cache = match &location {
            CacheLocation::Memory => MetadataCache::new(config.thumbnail_size),
            CacheLocation::File(path) => {
                let store = CacheStore::open(path)?;
                MetadataCache::with_store(store, config.thumbnail_size)
            }
        };
        log::debug!("Session opened with {:?} cache", location);

        Ok(Self {
            config,
            cache,
            selection: BTreeSet::new(),
        })
    }

    /// End the session, closing the cache store.
    ///
    /// # Errors
    ///
    /// Returns the error raised while closing the store.
    pub fn close(self) -> CacheResult<()> {
        let stats = self.cache.stats();
        log::debug!(
            "Session closed: {} hit(s), {} miss(es), {} caption refresh(es)",
            stats.hits,
            stats.misses,
            stats.caption_refreshes
        );
        self.cache.close()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The session cache.
    #[must_use]
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Mutable access to the session cache.
    pub fn cache_mut(&mut self) -> &mut MetadataCache {
        &mut self.cache
    }

    /// Scan `root`, read every image through the cache and filter by caption.
    ///
    /// Images that cannot be read or decoded are logged and reported in
    /// [`Listing::skipped`].
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] only when `root` itself cannot be scanned.
    pub fn list(
        &mut self,
        root: &Path,
        options: &ListOptions,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<Listing, ScanError> {
        let mut walker_config = self.config.walker_config();
        walker_config.recursive = options.recursive;

        if let Some(p) = progress {
            p.on_phase_start(PHASE_SCANNING, 0);
        }
        let scanned = Dataset::scan(root, walker_config);
        if let Some(p) = progress {
            p.on_phase_end(PHASE_SCANNING);
        }
        let mut dataset = scanned?;
        dataset.sort(options.sort);

        let mut listing = Listing::new(root);
        listing.scanned = dataset.len();
        let query = options.search.as_deref().unwrap_or("");

        if let Some(p) = progress {
            p.on_phase_start(PHASE_PROBING, dataset.len());
        }
        self.cache.batch(|cache| {
            for (i, path) in dataset.paths().enumerate() {
                if let Some(p) = progress {
                    p.on_progress(i + 1, &path.to_string_lossy());
                }
                match cache.get_or_compute(path) {
                    Ok(entry) => {
                        if caption::matches_query(&entry.caption_text, query) {
                            listing.images.push(entry.clone());
                        }
                    }
                    Err(e) => {
                        log::warn!("Skipping {}: {}", path.display(), e);
                        listing.skipped.push((path.to_path_buf(), e.to_string()));
                    }
                }
            }
        });
        if let Some(p) = progress {
            p.on_phase_end(PHASE_PROBING);
        }

        log::info!(
            "Listed {} of {} image(s) in {}",
            listing.len(),
            listing.scanned,
            root.display()
        );
        Ok(listing)
    }

    /// Apply `edit` to the caption of every listed image within `scope`.
    ///
    /// Images whose caption would not change are left untouched and counted
    /// as unchanged. Failures are collected, never fatal.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] only when `root` itself cannot be scanned.
    pub fn apply_caption_edit(
        &mut self,
        root: &Path,
        options: &ListOptions,
        edit: &CaptionEdit,
        scope: Scope,
    ) -> Result<BatchResult, ScanError> {
        let listing = self.list(root, options, None)?;
        let mut result = BatchResult::default();

        for (path, reason) in listing.skipped {
            result.failures.push((path, reason));
        }

        let selection = &self.selection;
        self.cache.batch(|cache| {
            for entry in &listing.images {
                if !scope.includes(&entry.caption_text, selection.contains(&entry.path)) {
                    continue;
                }

                let updated = edit.apply(&entry.caption_text);
                if updated == entry.caption_text {
                    result.unchanged.push(entry.path.clone());
                    continue;
                }

                match cache.save_caption(&entry.path, &updated) {
                    Ok(()) => result.processed.push(entry.path.clone()),
                    Err(e) => result.fail(&entry.path, e),
                }
            }
        });

        log::info!(
            "Caption edit ({}, scope {}): {}",
            edit.verb(),
            scope,
            result.summary("updated")
        );
        Ok(result)
    }

    /// Validated metadata for a single image.
    ///
    /// # Errors
    ///
    /// See [`MetadataCache::get_or_compute`].
    pub fn entry(&mut self, image: &Path) -> CacheResult<&CacheEntry> {
        self.cache.get_or_compute(image)
    }

    /// Write a caption and refresh its cache entry.
    ///
    /// # Errors
    ///
    /// See [`MetadataCache::save_caption`].
    pub fn save_caption(&mut self, image: &Path, text: &str) -> CacheResult<()> {
        self.cache.save_caption(image, text)
    }

    /// Add `image` to the selection. Returns `false` if it was already selected.
    pub fn select(&mut self, image: &Path) -> bool {
        self.selection.insert(cache_key(image))
    }

    /// Remove `image` from the selection. Returns whether it was selected.
    pub fn deselect(&mut self, image: &Path) -> bool {
        self.selection.remove(&cache_key(image))
    }

    /// Currently selected images (absolute paths).
    #[must_use]
    pub fn selection(&self) -> &BTreeSet<PathBuf> {
        &self.selection
    }

    /// Whether `image` is selected.
    #[must_use]
    pub fn is_selected(&self, image: &Path) -> bool {
        self.selection.contains(&cache_key(image))
    }

    /// Move or copy images (with captions) into `dest`.
    ///
    /// Moved images leave the cache and the selection.
    pub fn transfer(&mut self, images: &[PathBuf], dest: &Path, mode: TransferMode) -> BatchResult {
        let mut result = BatchResult::default();

        for image in images {
            match actions::transfer_image(image, dest, mode) {
                Ok(moved) => {
                    if mode == TransferMode::Move {
                        self.forget(image);
                    }
                    result.processed.push(moved.image);
                }
                Err(e) => result.fail(image, e),
            }
        }

        log::info!("{}", result.summary(mode.verb()));
        result
    }

    /// Delete images (with captions), to the trash unless `mode` says otherwise.
    pub fn delete(&mut self, images: &[PathBuf], mode: DeleteMode) -> BatchResult {
        let mut result = BatchResult::default();

        for image in images {
            match actions::delete_image(image, mode) {
                Ok(_) => {
                    self.forget(image);
                    result.processed.push(image.clone());
                }
                Err(e) => result.fail(image, e),
            }
        }

        log::info!("{}", result.summary("Deleted"));
        result
    }

    /// Open `image` in an external application, resolving `app` through the
    /// configured aliases.
    ///
    /// # Errors
    ///
    /// See [`actions::open_with`].
    pub fn open_with(&self, image: &Path, app: &str) -> Result<(), ActionError> {
        actions::open_with(image, self.config.resolve_app(app))
    }

    fn forget(&mut self, image: &Path) {
        self.cache.invalidate(image);
        self.selection.remove(&cache_key(image));
    }
}
