//! CSV output formatter for listings.
//!
//! One row per listed image.
//!
//! # Columns
//!
//! - `path`: Absolute path to the image
//! - `width`, `height`: Dimensions in pixels
//! - `format`: Detected container format
//! - `size_bytes`: File size in bytes
//! - `modified`: Last modified time (RFC 3339)
//! - `caption`: Caption text (empty when there is none)

use std::io;

use serde::Serialize;
use thiserror::Error;

use super::rfc3339;
use crate::cache::CacheEntry;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    path: String,
    width: u32,
    height: u32,
    format: &'a str,
    size_bytes: u64,
    modified: String,
    caption: &'a str,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    images: &'a [CacheEntry],
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(images: &'a [CacheEntry]) -> Self {
        Self { images }
    }

    /// Write the CSV output (with header row) to `writer`.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        if self.images.is_empty() {
            csv_writer.write_record([
                "path",
                "width",
                "height",
                "format",
                "size_bytes",
                "modified",
                "caption",
            ])?;
        }

        for entry in self.images {
            csv_writer.serialize(CsvRow {
                path: entry.path.to_string_lossy().into_owned(),
                width: entry.width,
                height: entry.height,
                format: &entry.format,
                size_bytes: entry.size_bytes,
                modified: rfc3339(entry.mtime),
                caption: &entry.caption_text,
            })?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
