//! Command-line interface definitions for capdeck.
//!
//! This module defines all CLI arguments and subcommands using the clap
//! derive API. Global options (verbosity, color, cache location) apply to
//! every subcommand.
//!
//! # Example
//!
//! ```bash
//! # List a dataset, newest first
//! capdeck list ~/datasets/cats --sort modified
//!
//! # Only images whose caption mentions "tabby", as JSON
//! capdeck list ~/datasets/cats --search tabby --output json
//!
//! # Append a tag to every caption
//! capdeck batch ~/datasets/cats --append ", photo"
//!
//! # Verbose mode for debugging
//! capdeck -v show ~/datasets/cats/001.png
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::caption::{CaptionEdit, Scope};
use crate::output::OutputFormat;
use crate::scanner::SortKey;

/// Browse image datasets and manage their caption files.
///
/// Every image may have a caption in a sibling `.txt` file with the same
/// name. Image metadata and thumbnails are cached between runs and
/// revalidated against the files on disk.
#[derive(Debug, Parser)]
#[command(name = "capdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON objects
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the metadata cache database
    ///
    /// If not specified, a default platform-specific path is used.
    #[arg(long, global = true, value_name = "FILE")]
    pub cache: Option<PathBuf>,

    /// Keep the metadata cache in memory only
    #[arg(long, global = true, conflicts_with = "cache")]
    pub no_cache: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the images of a dataset directory
    List(ListArgs),
    /// Show the metadata of one image
    Show(ShowArgs),
    /// Read or write a single caption
    #[command(subcommand)]
    Caption(CaptionCommand),
    /// Edit many captions at once
    Batch(BatchArgs),
    /// Move images (and captions) into a directory
    Move(TransferArgs),
    /// Copy images (and captions) into a directory
    Copy(TransferArgs),
    /// Delete images and their captions
    Delete(DeleteArgs),
    /// Open an image in an external application
    Open(OpenArgs),
    /// Inspect or maintain the metadata cache
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Locate or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for the list subcommand.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Dataset directory
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Sort order (defaults to the configured order)
    #[arg(long, value_enum)]
    pub sort: Option<SortKey>,

    /// Only list images whose caption contains this text (case-insensitive)
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Include images in subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Embed base64 thumbnails in JSON output
    #[arg(long)]
    pub thumbnails: bool,
}

/// Arguments for the show subcommand.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Image file
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Output format (text or json)
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Write the cached thumbnail (PNG) to this file
    #[arg(long, value_name = "FILE")]
    pub thumbnail_out: Option<PathBuf>,

    /// Include EXIF tags
    #[arg(long)]
    pub exif: bool,
}

/// Single-caption operations.
#[derive(Debug, Subcommand)]
pub enum CaptionCommand {
    /// Print the caption of an image
    Get {
        /// Image file
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
    /// Replace the caption of an image
    Set {
        /// Image file
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
        /// New caption text
        #[arg(value_name = "TEXT")]
        text: String,
    },
    /// Empty the captions of images
    Clear {
        /// Image files
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,
    },
}

/// Arguments for the batch subcommand.
#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Dataset directory
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    #[command(flatten)]
    pub edit: EditArgs,

    /// Replacement text for --replace (default: empty)
    #[arg(long = "with", value_name = "TEXT", requires = "replace")]
    pub with: Option<String>,

    /// Make --replace case-sensitive
    #[arg(long, requires = "replace")]
    pub match_case: bool,

    /// Which images to edit
    #[arg(long, value_enum, default_value = "all")]
    pub scope: Scope,

    /// Select an image for --scope selected (repeatable)
    #[arg(long = "select", value_name = "IMAGE")]
    pub selected: Vec<PathBuf>,

    /// Only edit images whose caption contains this text
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Include images in subdirectories
    #[arg(short, long)]
    pub recursive: bool,
}

/// The caption transform of a batch run. Exactly one is required.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct EditArgs {
    /// Append text to each caption
    #[arg(long, value_name = "TEXT")]
    pub append: Option<String>,

    /// Prepend text to each caption
    #[arg(long, value_name = "TEXT")]
    pub prepend: Option<String>,

    /// Replace occurrences of this text (see --with)
    #[arg(long, value_name = "TEXT")]
    pub replace: Option<String>,

    /// Replace every caption with this text
    #[arg(long, value_name = "TEXT")]
    pub set: Option<String>,

    /// Empty every caption
    #[arg(long)]
    pub clear: bool,
}

impl BatchArgs {
    /// The edit these flags describe.
    #[must_use]
    pub fn to_edit(&self) -> CaptionEdit {
        let edit = &self.edit;
        if let Some(text) = &edit.append {
            CaptionEdit::Append(text.clone())
        } else if let Some(text) = &edit.prepend {
            CaptionEdit::Prepend(text.clone())
        } else if let Some(search) = &edit.replace {
            CaptionEdit::Replace {
                search: search.clone(),
                replacement: self.with.clone().unwrap_or_default(),
                match_case: self.match_case,
            }
        } else if let Some(text) = &edit.set {
            CaptionEdit::Set(text.clone())
        } else {
            CaptionEdit::Clear
        }
    }
}

/// Arguments for the move and copy subcommands.
#[derive(Debug, Args)]
pub struct TransferArgs {
    /// Existing destination directory
    #[arg(value_name = "DEST")]
    pub dest: PathBuf,

    /// Images to transfer
    #[arg(value_name = "IMAGE", required = true)]
    pub images: Vec<PathBuf>,
}

/// Arguments for the delete subcommand.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Images to delete
    #[arg(value_name = "IMAGE", required = true)]
    pub images: Vec<PathBuf>,

    /// Use permanent deletion instead of moving to trash
    ///
    /// Warning: Files cannot be recovered after permanent deletion.
    #[arg(long)]
    pub permanent: bool,

    /// Confirm the deletion (required)
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the open subcommand.
#[derive(Debug, Args)]
pub struct OpenArgs {
    /// Image file
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Application name or configured alias
    #[arg(long = "with", value_name = "APP", default_value = "krita")]
    pub app: String,
}

/// Cache maintenance.
#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Show the number of cached entries and the database location
    Stats,
    /// Remove every cached entry
    Clear,
    /// Remove entries for images that no longer exist
    Prune,
}

/// Configuration file operations.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the path of the configuration file in use
    Path,
    /// Write the current settings as a TOML configuration file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}
