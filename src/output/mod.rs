//! Output formatters for dataset listings.
//!
//! This module provides different renderings of a [`Listing`]:
//! - Text for people, colored unless disabled
//! - JSON for automation and scripting
//! - CSV for spreadsheet import
//!
//! # Example
//!
//! ```no_run
//! use capdeck::config::Config;
//! use capdeck::output::json::JsonOutput;
//! use capdeck::session::{CacheLocation, ListOptions, Session};
//! use capdeck::error::ExitCode;
//! use std::path::Path;
//!
//! let mut session = Session::open(Config::default(), CacheLocation::Memory).unwrap();
//! let listing = session.list(Path::new("."), &ListOptions::default(), None).unwrap();
//!
//! let output = JsonOutput::new(&listing, session.cache().stats(), ExitCode::Success, false);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```
//!
//! [`Listing`]: crate::session::Listing

pub mod csv;
pub mod json;
pub mod text;

use std::time::SystemTime;

use chrono::{DateTime, Local, Utc};
use clap::ValueEnum;

pub use self::csv::CsvOutput;
pub use json::{JsonImage, JsonOutput};
pub use text::TextOutput;

/// Output format of listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document
    Json,
    /// Comma-separated values
    Csv,
}

/// Local time for display, e.g. `2024-03-01 14:05:09`.
#[must_use]
pub fn display_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// RFC 3339 UTC timestamp for machine-readable formats.
#[must_use]
pub fn rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339()
}
