//! capdeck - image dataset browser and caption manager
//!
//! Lists the images of a dataset directory with their sibling `.txt`
//! captions, edits captions one at a time or in batches, and moves, copies
//! or deletes images together with their captions. Decoded image metadata
//! and thumbnails are kept in a metadata cache that is revalidated against
//! the filesystem on every access and persisted in SQLite between runs.

pub mod actions;
pub mod cache;
pub mod caption;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod session;

pub use commands::run_app;
