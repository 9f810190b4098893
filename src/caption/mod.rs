//! Caption sidecar files.
//!
//! Every image may have exactly one caption: a UTF-8 text file next to it
//! with the same basename and a `.txt` extension (`cat.png` -> `cat.txt`).
//!
//! * [`edit`]: batch caption transforms and their scopes.

pub mod edit;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use edit::{CaptionEdit, Scope};

/// Extension of caption sidecar files.
pub const CAPTION_EXTENSION: &str = "txt";

/// Path of the caption sidecar for `image`.
///
/// # Example
///
/// ```
/// use capdeck::caption::caption_path;
/// use std::path::Path;
///
/// assert_eq!(caption_path(Path::new("data/cat.png")), Path::new("data/cat.txt"));
/// ```
#[must_use]
pub fn caption_path(image: &Path) -> PathBuf {
    image.with_extension(CAPTION_EXTENSION)
}

/// Read the caption of `image`, trimmed of surrounding whitespace.
///
/// Returns `Ok(None)` when the image has no sidecar.
///
/// # Errors
///
/// Any I/O error other than the sidecar not existing, including invalid
/// UTF-8 content.
pub fn read_caption(image: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(caption_path(image)) {
        Ok(text) => Ok(Some(normalize(&text))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write `text` verbatim to the caption sidecar of `image`, replacing any
/// existing caption.
///
/// # Errors
///
/// Returns the underlying I/O error if the sidecar cannot be written.
pub fn write_caption(image: &Path, text: &str) -> io::Result<PathBuf> {
    let path = caption_path(image);
    fs::write(&path, text.as_bytes())?;
    log::debug!("Wrote caption {} ({} bytes)", path.display(), text.len());
    Ok(path)
}

/// The form a caption takes once read back from disk.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.trim().to_string()
}

/// Case-insensitive substring search used to filter a dataset by caption.
///
/// An empty (or all-whitespace) query matches every caption.
#[must_use]
pub fn matches_query(caption: &str, query: &str) -> bool {
    let query = query.trim();
    query.is_empty() || caption.to_lowercase().contains(&query.to_lowercase())
}
