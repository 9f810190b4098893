//! Cache entry definitions.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Size and modification time of a file, the attributes an entry is
/// validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: SystemTime,
}

impl Fingerprint {
    /// Create a fingerprint from explicit values.
    #[must_use]
    pub fn new(size: u64, mtime: SystemTime) -> Self {
        Self { size, mtime }
    }

    /// Stat `path` without reading its content.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error, e.g. `NotFound`.
    pub fn of(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self {
            size: metadata.len(),
            mtime: metadata.modified().unwrap_or(UNIX_EPOCH),
        })
    }

    /// Like [`Fingerprint::of`], but a missing file yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Any I/O error other than `NotFound`.
    pub fn of_optional(path: &Path) -> io::Result<Option<Self>> {
        match Self::of(path) {
            Ok(fp) => Ok(Some(fp)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Modification time as nanoseconds since the Unix epoch.
    ///
    /// Times before the epoch collapse to zero.
    #[must_use]
    pub fn mtime_nanos(&self) -> i64 {
        system_time_to_nanos(self.mtime)
    }
}

/// Convert a timestamp to nanoseconds since the epoch for storage.
#[must_use]
pub fn system_time_to_nanos(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Inverse of [`system_time_to_nanos`].
#[must_use]
pub fn nanos_to_system_time(nanos: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_nanos(u64::try_from(nanos).unwrap_or(0))
}

/// Cached metadata for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Absolute path of the image.
    pub path: PathBuf,
    /// Image size in bytes when cached.
    pub size_bytes: u64,
    /// Image modification time when cached.
    pub mtime: SystemTime,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Detected container format.
    pub format: String,
    /// Decoder color type.
    pub color_type: String,
    /// Caption text, trimmed; empty when there is no sidecar.
    pub caption_text: String,
    /// Fingerprint of the caption sidecar the text was read from.
    pub caption_stamp: Option<Fingerprint>,
    /// PNG-encoded thumbnail.
    #[serde(skip)]
    pub thumbnail_data: Vec<u8>,
    /// When the entry was computed.
    pub cached_at: SystemTime,
    /// EXIF tags by name, empty when the file carries none.
    pub exif: BTreeMap<String, String>,
}

impl CacheEntry {
    /// Fingerprint of the image this entry was computed from.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(self.size_bytes, self.mtime)
    }

    /// Whether the image on disk still matches this entry.
    #[must_use]
    pub fn image_matches(&self, current: &Fingerprint) -> bool {
        self.fingerprint() == *current
    }

    /// Whether the caption sidecar on disk still matches this entry.
    #[must_use]
    pub fn caption_matches(&self, current: Option<&Fingerprint>) -> bool {
        self.caption_stamp.as_ref() == current
    }

    /// Whether this entry may be served for the given on-disk state.
    #[must_use]
    pub fn is_valid_for(&self, image: &Fingerprint, caption: Option<&Fingerprint>) -> bool {
        self.image_matches(image) && self.caption_matches(caption)
    }

    /// File name of the image for display.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Whether the image has a non-empty caption.
    #[must_use]
    pub fn has_caption(&self) -> bool {
        !self.caption_text.is_empty()
    }
}
