//! Progress reporting using indicatif.
//!
//! [`Progress`] implements [`ProgressCallback`] with a terminal progress bar.
//! indicatif hides the bar by itself when stderr is not a terminal.

use std::cell::RefCell;

use indicatif::{ProgressBar, ProgressStyle};

/// Phase reported while walking the directory tree.
pub const PHASE_SCANNING: &str = "scanning";
/// Phase reported while probing images through the cache.
pub const PHASE_PROBING: &str = "probing";

/// Receives progress updates while a dataset is listed.
pub trait ProgressCallback {
    /// Called when a phase starts with the number of items (0 if unknown).
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed (1-based).
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Replace the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    bar: RefCell<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter; `quiet` suppresses all output.
    ///
    /// ```
    /// use capdeck::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: RefCell::new(None),
            quiet,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = if total == 0 {
            let pb = ProgressBar::new_spinner();
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb
        } else {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(Self::bar_style());
            pb
        };
        pb.set_message(match phase {
            PHASE_SCANNING => "Scanning directory".to_string(),
            PHASE_PROBING => "Reading images".to_string(),
            other => other.to_string(),
        });

        if let Some(previous) = self.bar.replace(Some(pb)) {
            previous.finish_and_clear();
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if let Some(pb) = self.bar.borrow().as_ref() {
            pb.set_position(current as u64);
            pb.set_message(truncate_path(path, 30));
        }
    }

    fn on_phase_end(&self, _phase: &str) {
        if let Some(pb) = self.bar.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }

    fn on_message(&self, message: &str) {
        if let Some(pb) = self.bar.borrow().as_ref() {
            pb.set_message(message.to_string());
        }
    }
}

/// Shorten a path for display, keeping the file name.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let chars: Vec<char> = file_name.chars().collect();
    if chars.len() + 4 > max_len {
        let keep = max_len.saturating_sub(3);
        let tail: String = chars[chars.len().saturating_sub(keep)..].iter().collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
