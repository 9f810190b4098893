//! Moving and copying images with their caption sidecars.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use super::ActionError;
use crate::caption::caption_path;

/// Whether the source survives the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Relocate the files.
    Move,
    /// Duplicate the files, keeping modification times.
    Copy,
}

impl TransferMode {
    /// Past-tense verb for summaries.
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Self::Move => "Moved",
            Self::Copy => "Copied",
        }
    }
}

/// Where a transferred image (and caption) ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResult {
    /// New image path.
    pub image: PathBuf,
    /// New caption path, if the image had one.
    pub caption: Option<PathBuf>,
}

/// Move or copy `image` and its caption sidecar into `dest_dir`.
///
/// Nothing is overwritten: if the image or its caption already exists at
/// the destination the transfer fails before touching any file.
///
/// # Errors
///
/// - `DestinationMissing` if `dest_dir` is not an existing directory
/// - `DestinationExists` if a target file is already present
/// - `NotFound` / `PermissionDenied` / `Io` for filesystem failures
pub fn transfer_image(
    image: &Path,
    dest_dir: &Path,
    mode: TransferMode,
) -> Result<TransferResult, ActionError> {
    if !dest_dir.is_dir() {
        return Err(ActionError::DestinationMissing(dest_dir.to_path_buf()));
    }
    if !image.is_file() {
        return Err(ActionError::NotFound(image.to_path_buf()));
    }

    let target = target_in(dest_dir, image)?;
    let sidecar = caption_path(image);
    let has_caption = sidecar.is_file();
    let caption_target = if has_caption {
        Some(target_in(dest_dir, &sidecar)?)
    } else {
        None
    };

    for path in std::iter::once(&target).chain(caption_target.as_ref()) {
        if path.exists() {
            return Err(ActionError::DestinationExists(path.clone()));
        }
    }

    let caption_pair = caption_target.as_deref().map(|to| (sidecar.as_path(), to));
    transfer_pair(image, &target, caption_pair, mode)?;

    log::info!(
        "{} {} -> {}",
        mode.verb(),
        image.display(),
        target.display()
    );

    Ok(TransferResult {
        image: target,
        caption: caption_target,
    })
}

fn target_in(dest_dir: &Path, source: &Path) -> Result<PathBuf, ActionError> {
    source
        .file_name()
        .map(|name| dest_dir.join(name))
        .ok_or_else(|| ActionError::NotFound(source.to_path_buf()))
}

/// Transfer the image, then its caption. If the caption fails the image is
/// put back, so the pair never ends up split across directories.
fn transfer_pair(
    image: &Path,
    target: &Path,
    caption: Option<(&Path, &Path)>,
    mode: TransferMode,
) -> Result<(), ActionError> {
    transfer_file(image, target, mode)?;

    let Some((sidecar, caption_target)) = caption else {
        return Ok(());
    };
    if let Err(e) = transfer_file(sidecar, caption_target, mode) {
        // A partial copy of the caption is ours: the target was checked free.
        if caption_target.exists() && sidecar.exists() {
            if let Err(cleanup) = fs::remove_file(caption_target) {
                log::warn!("Failed to remove {}: {}", caption_target.display(), cleanup);
            }
        }
        let undo = match mode {
            TransferMode::Move => transfer_file(target, image, TransferMode::Move),
            TransferMode::Copy => {
                fs::remove_file(target).map_err(|err| ActionError::from_io(target, err))
            }
        };
        if let Err(undo) = undo {
            log::warn!(
                "Could not undo transfer of {} ({}); it remains at {}",
                image.display(),
                undo,
                target.display()
            );
        }
        return Err(e);
    }
    Ok(())
}

fn transfer_file(from: &Path, to: &Path, mode: TransferMode) -> Result<(), ActionError> {
    match mode {
        TransferMode::Copy => copy_preserving_mtime(from, to),
        TransferMode::Move => match fs::rename(from, to) {
            Ok(()) => Ok(()),
            // rename cannot cross filesystems; fall back to copy + remove.
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                copy_preserving_mtime(from, to)?;
                fs::remove_file(from).map_err(|e| ActionError::from_io(from, e))
            }
            Err(e) => Err(ActionError::from_io(from, e)),
        },
    }
}

fn copy_preserving_mtime(from: &Path, to: &Path) -> Result<(), ActionError> {
    fs::copy(from, to).map_err(|e| ActionError::from_io(from, e))?;

    let metadata = fs::metadata(from).map_err(|e| ActionError::from_io(from, e))?;
    let mtime = FileTime::from_last_modification_time(&metadata);
    let atime = FileTime::from_last_access_time(&metadata);
    filetime::set_file_times(to, atime, mtime).map_err(|e| ActionError::from_io(to, e))
}
