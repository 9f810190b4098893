//! Caption transforms applied by batch operations.

use clap::ValueEnum;
use regex::{NoExpand, RegexBuilder};
use serde::{Deserialize, Serialize};

/// A transform from the current caption to a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionEdit {
    /// Replace the caption with fixed text.
    Set(String),
    /// Empty the caption.
    Clear,
    /// Add text after the current caption.
    Append(String),
    /// Add text before the current caption.
    Prepend(String),
    /// Replace every occurrence of `search` with `replacement`.
    ///
    /// `search` is literal text. Without `match_case`, letters match
    /// regardless of case.
    Replace {
        /// Text to look for
        search: String,
        /// Text to put in its place
        replacement: String,
        /// Compare letters exactly
        match_case: bool,
    },
}

impl CaptionEdit {
    /// Compute the new caption.
    #[must_use]
    pub fn apply(&self, current: &str) -> String {
        match self {
            Self::Set(text) => text.clone(),
            Self::Clear => String::new(),
            Self::Append(text) => format!("{current}{text}"),
            Self::Prepend(text) => format!("{text}{current}"),
            Self::Replace {
                search,
                replacement,
                match_case,
            } => replace(current, search, replacement, *match_case),
        }
    }

    /// Short verb describing the edit, for summaries.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Set(_) => "set",
            Self::Clear => "cleared",
            Self::Append(_) => "appended",
            Self::Prepend(_) => "prepended",
            Self::Replace { .. } => "replaced",
        }
    }
}

fn replace(current: &str, search: &str, replacement: &str, match_case: bool) -> String {
    if search.is_empty() {
        return current.to_string();
    }
    if match_case {
        return current.replace(search, replacement);
    }

    match RegexBuilder::new(&regex::escape(search))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re.replace_all(current, NoExpand(replacement)).into_owned(),
        Err(e) => {
            // Escaped literals only fail on size limits.
            log::warn!("Cannot build matcher for '{}': {}", search, e);
            current.to_string()
        }
    }
}

/// Which images of a dataset a batch edit touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Every image
    #[default]
    All,
    /// Only images in the session selection
    Selected,
    /// Only images that already have a non-empty caption
    Captioned,
}

impl Scope {
    /// Whether an image with `caption` and selection state `selected` is in
    /// scope.
    #[must_use]
    pub fn includes(self, caption: &str, selected: bool) -> bool {
        match self {
            Self::All => true,
            Self::Selected => selected,
            Self::Captioned => !caption.trim().is_empty(),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::All => write!(f, "all"),
            Scope::Selected => write!(f, "selected"),
            Scope::Captioned => write!(f, "captioned"),
        }
    }
}
