//! Human-readable text output.
//!
//! ```text
//! cat.png  512x512 PNG  20.0 KiB  2024-03-01 14:05:09
//!   a cat on a mat
//! dog.png  640x480 JPEG  48.1 KiB  2024-03-02 09:12:44
//!   (no caption)
//!
//! 2 image(s), 1 captioned, 68.1 KiB
//! ```

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::{Condition, Paint, Painted};

use super::display_time;
use crate::cache::CacheEntry;
use crate::session::Listing;

/// Text renderer for listings and single images.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput {
    color: Condition,
}

impl TextOutput {
    /// Create a renderer; `color` false strips all styling.
    #[must_use]
    pub fn new(color: bool) -> Self {
        Self {
            color: if color {
                Condition::ALWAYS
            } else {
                Condition::NEVER
            },
        }
    }

    /// Write one block per image followed by a summary line.
    ///
    /// # Errors
    ///
    /// Returns any error from `writer`.
    pub fn write_listing<W: Write>(&self, listing: &Listing, writer: &mut W) -> io::Result<()> {
        for entry in &listing.images {
            self.write_entry(entry, writer)?;
        }

        for (path, reason) in &listing.skipped {
            writeln!(
                writer,
                "{} {}: {}",
                "skipped".yellow().whenever(self.color),
                path.display(),
                reason
            )?;
        }

        writeln!(writer)?;
        let mut summary = format!(
            "{} image(s), {} captioned, {}",
            listing.len(),
            listing.captioned(),
            ByteSize::b(listing.total_bytes())
        );
        if !listing.skipped.is_empty() {
            summary.push_str(&format!(", {} skipped", listing.skipped.len()));
        }
        writeln!(writer, "{}", summary.bold().whenever(self.color))
    }

    /// Write the block for a single image.
    ///
    /// # Errors
    ///
    /// Returns any error from `writer`.
    pub fn write_entry<W: Write>(&self, entry: &CacheEntry, writer: &mut W) -> io::Result<()> {
        writeln!(
            writer,
            "{}  {}x{} {}  {}  {}",
            entry.file_name().bold().whenever(self.color),
            entry.width,
            entry.height,
            entry.format.cyan().whenever(self.color),
            ByteSize::b(entry.size_bytes),
            display_time(entry.mtime).dim().whenever(self.color)
        )?;

        if entry.has_caption() {
            writeln!(writer, "  {}", entry.caption_text)
        } else {
            writeln!(writer, "  {}", "(no caption)".dim().italic().whenever(self.color))
        }
    }

    /// Write the detailed view used by `show`.
    ///
    /// # Errors
    ///
    /// Returns any error from `writer`.
    pub fn write_details<W: Write>(&self, entry: &CacheEntry, writer: &mut W) -> io::Result<()> {
        let label = |name: &str| {
            Painted::new(format!("{:<11}", name))
                .green()
                .whenever(self.color)
        };

        writeln!(writer, "{} {}", label("Path:"), entry.path.display())?;
        writeln!(
            writer,
            "{} {}x{}",
            label("Size:"),
            entry.width,
            entry.height
        )?;
        writeln!(writer, "{} {}", label("Format:"), entry.format)?;
        writeln!(writer, "{} {}", label("Color:"), entry.color_type)?;
        writeln!(
            writer,
            "{} {}",
            label("File size:"),
            ByteSize::b(entry.size_bytes)
        )?;
        writeln!(
            writer,
            "{} {}",
            label("Modified:"),
            display_time(entry.mtime)
        )?;
        writeln!(writer, "{} {}", label("Caption:"), entry.caption_text)
    }

    /// Write the EXIF tags of one image, one `tag: value` line each.
    ///
    /// # Errors
    ///
    /// Returns any error from `writer`.
    pub fn write_exif<W: Write>(&self, entry: &CacheEntry, writer: &mut W) -> io::Result<()> {
        let heading = Painted::new("EXIF:").green().whenever(self.color);
        if entry.exif.is_empty() {
            return writeln!(writer, "{} none", heading);
        }
        writeln!(writer, "{}", heading)?;
        for (tag, value) in &entry.exif {
            writeln!(writer, "  {}: {}", tag, value)?;
        }
        Ok(())
    }
}
