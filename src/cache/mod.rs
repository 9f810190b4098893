//! Metadata caching module for capdeck.
//!
//! This module keeps decoded image attributes (dimensions, format, caption,
//! thumbnail) so that repeated views of a dataset do not decode every image
//! again.
//!
//! # Architecture
//!
//! * [`metadata`]: [`MetadataCache`], the validated in-memory cache.
//! * [`database`]: SQLite persistence, schema management, and CRUD operations.
//! * [`entry`]: The data model stored in the cache and its validation logic.
//! * [`error`]: Error types shared by the above.
//!
//! # Cache Invalidation
//!
//! Entries are validated on every lookup using:
//! * Image path (absolute, primary key)
//! * Image size
//! * Image modification time (mtime)
//! * Size and mtime of the caption sidecar
//!
//! If the image attributes change, the entry is never served and the image
//! is decoded again. If only the sidecar changed, only the caption is
//! re-read.
//!
//! # Example
//!
//! ```no_run
//! use capdeck::cache::MetadataCache;
//! use std::path::Path;
//!
//! let mut cache = MetadataCache::new(256);
//! let entry = cache.get_or_compute(Path::new("cat.png")).unwrap();
//! println!("{}x{} {}", entry.width, entry.height, entry.caption_text);
//! ```

pub mod database;
pub mod entry;
pub mod error;
pub mod metadata;

pub use database::CacheStore;
pub use entry::{CacheEntry, Fingerprint};
pub use error::{CacheError, CacheResult};
pub use metadata::{cache_key, CacheStats, MetadataCache, DEFAULT_THUMBNAIL_SIZE};
