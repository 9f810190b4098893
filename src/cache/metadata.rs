//! The metadata cache: validated lookups with recompute on change.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

use super::database::CacheStore;
use super::entry::{CacheEntry, Fingerprint};
use super::error::{CacheError, CacheResult};
use crate::caption::{self, caption_path};
use crate::scanner::probe_image;

/// Longest thumbnail edge used when nothing else is configured.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 256;

/// Counters describing how lookups were served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups served from a valid entry without touching image content.
    pub hits: usize,
    /// Lookups that decoded the image.
    pub misses: usize,
    /// Lookups that only re-read a changed caption sidecar.
    pub caption_refreshes: usize,
    /// Entries dropped by [`MetadataCache::invalidate`].
    pub invalidations: usize,
}

/// How an existing entry relates to the files on disk.
enum Freshness {
    Valid,
    CaptionChanged,
    Stale,
}

/// Per-path image metadata, revalidated on every access.
///
/// An entry is only served while the image's size and modification time
/// (and the caption sidecar's) match what was recorded. Otherwise the image
/// is decoded again. When a [`CacheStore`] is attached, rows are fetched the
/// first time a path is requested and every change is written through, so
/// the next session starts warm.
#[derive(Debug)]
pub struct MetadataCache {
    entries: HashMap<PathBuf, CacheEntry>,
    store: Option<CacheStore>,
    thumbnail_size: u32,
    stats: CacheStats,
}

impl MetadataCache {
    /// Create an empty cache that lives only in memory.
    #[must_use]
    pub fn new(thumbnail_size: u32) -> Self {
        Self {
            entries: HashMap::new(),
            store: None,
            thumbnail_size,
            stats: CacheStats::default(),
        }
    }

    /// Create a cache backed by `store`.
    ///
    /// Nothing is loaded up front. A stored row is read when its path is
    /// first requested and validated like any other entry.
    #[must_use]
    pub fn with_store(store: CacheStore, thumbnail_size: u32) -> Self {
        Self {
            entries: HashMap::new(),
            store: Some(store),
            thumbnail_size,
            stats: CacheStats::default(),
        }
    }

    /// Return a valid entry for `path`, decoding the image if needed.
    ///
    /// A hit costs two `stat` calls (image and caption sidecar). A changed
    /// sidecar re-reads only the caption; a changed image is decoded again.
    ///
    /// # Errors
    ///
    /// [`CacheError::Io`] if the image or its caption cannot be read,
    /// [`CacheError::Decode`] if the image content is invalid. Either way any
    /// stale entry for the path is dropped.
    pub fn get_or_compute(&mut self, path: &Path) -> CacheResult<&CacheEntry> {
        let key = cache_key(path);

        let image_fp = match Fingerprint::of(&key) {
            Ok(fp) => fp,
            Err(e) => {
                self.drop_entry(&key);
                return Err(CacheError::io(&key, e));
            }
        };
        let sidecar = caption_path(&key);
        let caption_fp =
            Fingerprint::of_optional(&sidecar).map_err(|e| CacheError::io(&sidecar, e))?;

        if !self.entries.contains_key(&key) {
            if let Some(stored) = self.load_stored(&key) {
                self.entries.insert(key.clone(), stored);
            }
        }

        let thumbnail_size = self.thumbnail_size;
        let store = self.store.as_ref();
        let stats = &mut self.stats;

        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                let freshness = {
                    let cached = slot.get();
                    if cached.is_valid_for(&image_fp, caption_fp.as_ref()) {
                        Freshness::Valid
                    } else if cached.image_matches(&image_fp) {
                        Freshness::CaptionChanged
                    } else {
                        Freshness::Stale
                    }
                };

                match freshness {
                    Freshness::Valid => {
                        stats.hits += 1;
                        log::trace!("Cache hit: {}", slot.key().display());
                    }
                    Freshness::CaptionChanged => {
                        let text = read_caption_text(slot.key())?;
                        let cached = slot.get_mut();
                        cached.caption_text = text;
                        cached.caption_stamp = caption_fp;
                        stats.caption_refreshes += 1;
                        log::debug!("Caption changed on disk: {}", cached.path.display());
                        write_caption_through(store, cached);
                    }
                    Freshness::Stale => {
                        log::debug!("Cache entry stale: {}", slot.key().display());
                        match compute_entry(slot.key(), image_fp, caption_fp, thumbnail_size) {
                            Ok(fresh) => {
                                stats.misses += 1;
                                write_through(store, &fresh);
                                *slot.get_mut() = fresh;
                            }
                            Err(e) => {
                                let (key, _) = slot.remove_entry();
                                remove_through(store, &key);
                                return Err(e);
                            }
                        }
                    }
                }
                Ok(slot.into_mut())
            }
            Entry::Vacant(slot) => {
                let fresh = compute_entry(slot.key(), image_fp, caption_fp, thumbnail_size)?;
                stats.misses += 1;
                log::trace!("Cache miss: {}", slot.key().display());
                write_through(store, &fresh);
                Ok(slot.insert(fresh))
            }
        }
    }

    /// The entry held in memory for `path`, without validating it against
    /// disk or consulting the store.
    #[must_use]
    pub fn peek(&self, path: &Path) -> Option<&CacheEntry> {
        self.entries.get(&cache_key(path))
    }

    /// Drop the entry for `path`, forcing a recompute on next access.
    ///
    /// Returns whether an entry existed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let key = cache_key(path);
        let existed = self.drop_entry(&key);
        if existed {
            self.stats.invalidations += 1;
            log::debug!("Invalidated {}", key.display());
        }
        existed
    }

    /// Write `text` to the caption sidecar of `path` and update the cached
    /// entry so the next lookup is a hit reflecting the new caption.
    ///
    /// If nothing is cached for `path` only the sidecar is written.
    ///
    /// # Errors
    ///
    /// [`CacheError::CaptionWrite`] if the sidecar cannot be written.
    pub fn save_caption(&mut self, path: &Path, text: &str) -> CacheResult<()> {
        let key = cache_key(path);
        let written =
            caption::write_caption(&key, text).map_err(|source| CacheError::CaptionWrite {
                path: caption_path(&key),
                source,
            })?;

        if let Some(cached) = self.entries.get_mut(&key) {
            cached.caption_text = caption::normalize(text);
            // Without a stamp the next lookup simply re-reads the sidecar.
            cached.caption_stamp = Fingerprint::of_optional(&written).unwrap_or_default();
            write_caption_through(self.store.as_ref(), cached);
        }

        log::info!("Saved caption for {}", key.display());
        Ok(())
    }

    /// Drop entries, in memory and in the store, whose image no longer
    /// exists. Returns how many went.
    pub fn prune(&mut self) -> usize {
        let mut known: BTreeSet<PathBuf> = self.entries.keys().cloned().collect();
        if let Some(store) = &self.store {
            match store.paths() {
                Ok(paths) => known.extend(paths),
                Err(e) => log::warn!("Could not list cached metadata: {}", e),
            }
        }

        let gone: Vec<PathBuf> = known.into_iter().filter(|p| !p.exists()).collect();
        for key in &gone {
            self.drop_entry(key);
        }
        if !gone.is_empty() {
            log::info!("Pruned {} entries for missing images", gone.len());
        }
        gone.len()
    }

    /// Run `f` with every store write it causes grouped into one
    /// transaction.
    ///
    /// Without a store, or when the transaction cannot be started, `f` runs
    /// with one write per change.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let started = match &self.store {
            Some(store) => store.begin_batch().unwrap_or_else(|e| {
                log::warn!("Could not group cache writes: {}", e);
                false
            }),
            None => false,
        };

        let result = f(self);

        if started {
            if let Some(store) = &self.store {
                if let Err(e) = store.commit_batch() {
                    log::warn!("Failed to persist cached metadata: {}", e);
                }
            }
        }
        result
    }

    /// Drop every entry, in memory and in the store.
    ///
    /// # Errors
    ///
    /// Returns a database error if the store cannot be cleared.
    pub fn clear(&mut self) -> CacheResult<usize> {
        let mut removed = self.entries.len();
        self.entries.clear();
        if let Some(store) = &self.store {
            removed = removed.max(store.clear()?);
        }
        Ok(removed)
    }

    /// Number of entries held in memory this session.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookup counters since the cache was created.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// The attached persistent store, if any.
    #[must_use]
    pub fn store(&self) -> Option<&CacheStore> {
        self.store.as_ref()
    }

    /// Tear the cache down, closing the store.
    ///
    /// # Errors
    ///
    /// Returns the error SQLite raises while closing.
    pub fn close(self) -> CacheResult<()> {
        match self.store {
            Some(store) => store.close(),
            None => Ok(()),
        }
    }

    fn load_stored(&self, key: &Path) -> Option<CacheEntry> {
        let store = self.store.as_ref()?;
        match store.get(key) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("Could not read cached metadata for {}: {}", key.display(), e);
                None
            }
        }
    }

    fn drop_entry(&mut self, key: &Path) -> bool {
        let in_memory = self.entries.remove(key).is_some();
        let in_store = remove_through(self.store.as_ref(), key);
        in_memory || in_store
    }
}

/// Key under which `path` is cached.
///
/// Relative paths are made absolute against the working directory so that
/// `a.png` and `./a.png` share an entry. Symlinks are not resolved.
#[must_use]
pub fn cache_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn read_caption_text(image: &Path) -> CacheResult<String> {
    caption::read_caption(image)
        .map(Option::unwrap_or_default)
        .map_err(|e| CacheError::io(&caption_path(image), e))
}

fn compute_entry(
    key: &Path,
    image_fp: Fingerprint,
    caption_fp: Option<Fingerprint>,
    thumbnail_size: u32,
) -> CacheResult<CacheEntry> {
    let probe = probe_image(key, thumbnail_size)?;
    let caption_text = read_caption_text(key)?;

    Ok(CacheEntry {
        path: key.to_path_buf(),
        size_bytes: image_fp.size,
        mtime: image_fp.mtime,
        width: probe.width,
        height: probe.height,
        format: probe.format,
        color_type: probe.color_type,
        caption_text,
        caption_stamp: caption_fp,
        thumbnail_data: probe.thumbnail_png,
        cached_at: SystemTime::now(),
        exif: probe.exif,
    })
}

fn write_through(store: Option<&CacheStore>, entry: &CacheEntry) {
    if let Some(store) = store {
        if let Err(e) = store.upsert(entry) {
            log::warn!("Failed to persist metadata for {}: {}", entry.path.display(), e);
        }
    }
}

fn write_caption_through(store: Option<&CacheStore>, entry: &CacheEntry) {
    if let Some(store) = store {
        if let Err(e) =
            store.update_caption(&entry.path, &entry.caption_text, entry.caption_stamp.as_ref())
        {
            log::warn!("Failed to persist caption for {}: {}", entry.path.display(), e);
        }
    }
}

fn remove_through(store: Option<&CacheStore>, key: &Path) -> bool {
    match store.map(|s| s.remove(key)) {
        Some(Ok(removed)) => removed,
        Some(Err(e)) => {
            log::warn!("Failed to drop stored metadata for {}: {}", key.display(), e);
            false
        }
        None => false,
    }
}
