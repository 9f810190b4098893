//! JSON output formatter for listings.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "images": [
//!     {
//!       "path": "/data/cat.png",
//!       "file_name": "cat.png",
//!       "width": 512,
//!       "height": 512,
//!       "format": "PNG",
//!       "color_type": "Rgb8",
//!       "size_bytes": 20480,
//!       "modified": "2024-03-01T13:05:09+00:00",
//!       "caption": "a cat on a mat"
//!     }
//!   ],
//!   "summary": {
//!     "root": "/data",
//!     "scanned": 3,
//!     "listed": 1,
//!     "captioned": 1,
//!     "skipped": 1,
//!     "skipped_files": [{ "path": "/data/broken.png", "reason": "..." }],
//!     "total_size": 20480,
//!     "cache": { "hits": 0, "misses": 3, "caption_refreshes": 0, "invalidations": 0 },
//!     "exit_code": 3,
//!     "exit_code_name": "CD003"
//!   }
//! }
//! ```
//!
//! Each image carries a base64 `thumbnail` (PNG) only when requested, and
//! `show --exif` adds an `exif` object of tag names to values.

use std::collections::BTreeMap;
use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use super::rfc3339;
use crate::cache::{CacheEntry, CacheStats};
use crate::error::ExitCode;
use crate::session::Listing;

/// A single image in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonImage {
    /// Absolute path to the image
    pub path: String,
    /// File name only
    pub file_name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected container format
    pub format: String,
    /// Pixel layout
    pub color_type: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Last modified time (RFC 3339)
    pub modified: String,
    /// Caption text, empty when there is none
    pub caption: String,
    /// Base64 PNG thumbnail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// EXIF tags, only with `show --exif`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exif: Option<BTreeMap<String, String>>,
}

impl JsonImage {
    /// Convert a cache entry, optionally embedding its thumbnail.
    #[must_use]
    pub fn from_entry(entry: &CacheEntry, include_thumbnail: bool) -> Self {
        Self {
            path: entry.path.to_string_lossy().into_owned(),
            file_name: entry.file_name(),
            width: entry.width,
            height: entry.height,
            format: entry.format.clone(),
            color_type: entry.color_type.clone(),
            size_bytes: entry.size_bytes,
            modified: rfc3339(entry.mtime),
            caption: entry.caption_text.clone(),
            thumbnail: include_thumbnail.then(|| STANDARD.encode(&entry.thumbnail_data)),
            exif: None,
        }
    }

    /// Attach the EXIF tags of `entry`.
    #[must_use]
    pub fn with_exif(mut self, entry: &CacheEntry) -> Self {
        self.exif = Some(entry.exif.clone());
        self
    }
}

/// An image that could not be listed.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSkipped {
    /// Path to the image
    pub path: String,
    /// Why it was skipped
    pub reason: String,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Directory that was listed
    pub root: String,
    /// Image files found by the scan
    pub scanned: usize,
    /// Images in the output
    pub listed: usize,
    /// Listed images with a caption
    pub captioned: usize,
    /// Images that could not be read
    pub skipped: usize,
    /// Details of skipped images
    pub skipped_files: Vec<JsonSkipped>,
    /// Total size of listed images in bytes
    pub total_size: u64,
    /// Cache counters for this run
    pub cache: CacheStats,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "CD000")
    pub exit_code_name: String,
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Listed images
    pub images: Vec<JsonImage>,
    /// Listing summary
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the JSON document for `listing`.
    #[must_use]
    pub fn new(
        listing: &Listing,
        cache: CacheStats,
        exit_code: ExitCode,
        include_thumbnails: bool,
    ) -> Self {
        Self {
            images: listing
                .images
                .iter()
                .map(|e| JsonImage::from_entry(e, include_thumbnails))
                .collect(),
            summary: JsonSummary {
                root: listing.root.to_string_lossy().into_owned(),
                scanned: listing.scanned,
                listed: listing.len(),
                captioned: listing.captioned(),
                skipped: listing.skipped.len(),
                skipped_files: listing
                    .skipped
                    .iter()
                    .map(|(path, reason)| JsonSkipped {
                        path: path.to_string_lossy().into_owned(),
                        reason: reason.clone(),
                    })
                    .collect(),
                total_size: listing.total_bytes(),
                cache,
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
