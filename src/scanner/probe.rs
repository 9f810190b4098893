//! Image probing: decode an image once and extract what the cache keeps.
//!
//! Probing is the expensive step the metadata cache exists to avoid. It
//! opens the file, sniffs the format from its content (falling back to the
//! extension), decodes it, records dimensions and color type, renders a PNG
//! thumbnail, and collects any EXIF tags.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, ImageReader};
use thiserror::Error;

/// Errors that can occur while probing an image.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The file could not be opened or read.
    #[error("Failed to read image {path}: {source}")]
    Io {
        /// Image path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file was readable but is not a valid image.
    #[error("Failed to decode image {path}: {source}")]
    Decode {
        /// Image path
        path: PathBuf,
        /// The decoder error
        #[source]
        source: image::ImageError,
    },
}

/// Attributes extracted from a decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageProbe {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Detected container format (e.g. `PNG`), empty if unknown.
    pub format: String,
    /// Pixel layout reported by the decoder (e.g. `Rgb8`).
    pub color_type: String,
    /// PNG-encoded thumbnail bytes.
    pub thumbnail_png: Vec<u8>,
    /// EXIF tags of the primary image, by tag name.
    pub exif: BTreeMap<String, String>,
}

/// Decode the image at `path` and build a thumbnail whose longest edge is at
/// most `thumbnail_size` pixels.
///
/// # Errors
///
/// [`ProbeError::Io`] if the file cannot be opened, [`ProbeError::Decode`]
/// if its content is not a decodable image.
pub fn probe_image(path: &Path, thumbnail_size: u32) -> Result<ImageProbe, ProbeError> {
    let io_err = |source| ProbeError::Io {
        path: path.to_path_buf(),
        source,
    };

    let reader = ImageReader::open(path)
        .map_err(io_err)?
        .with_guessed_format()
        .map_err(io_err)?;

    let format = reader.format().map(format_name).unwrap_or_default();

    let img = reader.decode().map_err(|source| ProbeError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let thumbnail_png = encode_thumbnail(&img, thumbnail_size).map_err(|source| {
        ProbeError::Decode {
            path: path.to_path_buf(),
            source,
        }
    })?;

    log::trace!(
        "Probed {} ({}x{} {})",
        path.display(),
        img.width(),
        img.height(),
        format
    );

    Ok(ImageProbe {
        width: img.width(),
        height: img.height(),
        format,
        color_type: format!("{:?}", img.color()),
        thumbnail_png,
        exif: read_exif(path),
    })
}

/// Collect the EXIF tags of the primary image.
///
/// Missing or malformed EXIF yields an empty map and never fails decoding.
fn read_exif(path: &Path) -> BTreeMap<String, String> {
    let Ok(file) = File::open(path) else {
        return BTreeMap::new();
    };

    let exif = match exif::Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return BTreeMap::new(),
        Err(e) => {
            log::trace!("No usable EXIF in {}: {}", path.display(), e);
            return BTreeMap::new();
        }
    };

    exif.fields()
        .filter(|field| field.ifd_num == exif::In::PRIMARY)
        .map(|field| {
            let value = match &field.value {
                exif::Value::Ascii(parts) => parts
                    .iter()
                    .map(|part| String::from_utf8_lossy(part).trim().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                _ => field.display_value().with_unit(&exif).to_string(),
            };
            (field.tag.to_string(), value)
        })
        .collect()
}

/// Render `img` down to fit a `size` x `size` box and encode it as PNG.
///
/// Images already inside the box are encoded at their own size.
fn encode_thumbnail(img: &DynamicImage, size: u32) -> Result<Vec<u8>, image::ImageError> {
    let size = size.max(1);
    let thumb = if img.width() > size || img.height() > size {
        img.thumbnail(size, size)
    } else {
        img.clone()
    };

    // PNG cannot store float pixels; RGBA8 is always encodable.
    let thumb = DynamicImage::ImageRgba8(thumb.to_rgba8());

    let mut buf = Vec::new();
    thumb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

fn format_name(format: ImageFormat) -> String {
    format!("{format:?}").to_uppercase()
}
