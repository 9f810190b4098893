//! Process exit codes and machine-readable error reports.

use serde::Serialize;

/// Exit status of a capdeck invocation.
///
/// - 0: success
/// - 1: general error (nothing useful was done)
/// - 2: the directory contains no images (or none matched the search)
/// - 3: partial success (some images were skipped or failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Everything succeeded.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// No images were found.
    NoImages = 2,
    /// Completed, but some items were skipped or failed.
    PartialSuccess = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "CD000",
            Self::GeneralError => "CD001",
            Self::NoImages => "CD002",
            Self::PartialSuccess => "CD003",
        }
    }

    /// `PartialSuccess` when anything failed, `Success` otherwise.
    #[must_use]
    pub fn from_failures(failures: usize) -> Self {
        if failures == 0 {
            Self::Success
        } else {
            Self::PartialSuccess
        }
    }
}

/// Error report printed with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Error code (e.g., "CD001").
    pub code: String,
    /// Numeric exit code.
    pub exit_code: i32,
    /// Human-readable message, including the cause chain.
    pub message: String,
}

impl StructuredError {
    /// Build a report from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
        }
    }
}
