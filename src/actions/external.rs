//! Opening images in external applications.

use std::path::Path;
use std::process::Command;

use super::ActionError;

/// Build the command that opens `image` with `program` on this platform.
///
/// `program` is an application name or path with aliases already resolved
/// (see [`crate::config::Config::resolve_app`]).
#[must_use]
pub fn launch_command(image: &Path, program: &str) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg("-a").arg(program).arg(image);
        cmd
    } else if cfg!(windows) {
        // Windows hands the file to its registered default handler.
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(image);
        cmd
    } else {
        let mut cmd = Command::new(program);
        cmd.arg(image);
        cmd
    }
}

/// Launch `program` on `image` without waiting for it to exit.
///
/// # Errors
///
/// - `NotFound` if the image doesn't exist
/// - `LaunchFailed` if the process cannot be spawned
pub fn open_with(image: &Path, program: &str) -> Result<(), ActionError> {
    if !image.exists() {
        return Err(ActionError::NotFound(image.to_path_buf()));
    }

    let mut cmd = launch_command(image, program);
    log::debug!("Launching {:?}", cmd);
    cmd.spawn().map_err(|source| ActionError::LaunchFailed {
        app: program.to_string(),
        source,
    })?;

    log::info!("Opened {} with {}", image.display(), program);
    Ok(())
}
