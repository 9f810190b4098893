//! Application configuration management.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`<config dir>/capdeck/config.toml`, or `--config`)
//! 3. Environment variables prefixed with `CAPDECK_` (`__` separates nested keys)
//! 4. Command-line flags, applied with [`Config::merge_cli`]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_THUMBNAIL_SIZE;
use crate::scanner::{SortKey, WalkerConfig, DEFAULT_EXTENSIONS};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CAPDECK_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File extensions treated as images (case-insensitive, no dot).
    pub extensions: Vec<String>,
    /// Longest edge of generated thumbnails, in pixels.
    pub thumbnail_size: u32,
    /// Descend into subdirectories when scanning.
    pub recursive: bool,
    /// Skip dotfiles and dot-directories.
    pub skip_hidden: bool,
    /// Follow symbolic links while scanning.
    pub follow_symlinks: bool,
    /// Default listing order.
    pub sort: SortKey,
    /// Metadata database location; platform cache dir when unset.
    pub cache_path: Option<PathBuf>,
    /// Application aliases for `open --with`.
    pub apps: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut apps = BTreeMap::new();
        apps.insert("krita".to_string(), default_app("krita"));
        apps.insert("gimp".to_string(), default_app("gimp"));

        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            recursive: false,
            skip_hidden: true,
            follow_symlinks: false,
            sort: SortKey::Name,
            cache_path: None,
            apps,
        }
    }
}

#[cfg(target_os = "macos")]
fn default_app(name: &str) -> String {
    match name {
        "krita" => "Krita".to_string(),
        "gimp" => "GIMP".to_string(),
        other => other.to_string(),
    }
}

#[cfg(not(target_os = "macos"))]
fn default_app(name: &str) -> String {
    name.to_string()
}

/// Command-line values that take precedence over every other layer.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `-r/--recursive`
    pub recursive: bool,
    /// `--sort`
    pub sort: Option<SortKey>,
    /// `--cache`
    pub cache_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default layers.
    ///
    /// A broken config file is logged and defaults are used instead.
    #[must_use]
    pub fn load(config_path: Option<&Path>) -> Self {
        let path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_path().ok(),
        };

        let result = match &path {
            Some(path) => Self::load_from_path(path),
            None => Self::figment(None).extract().map_err(Into::into),
        };

        match result {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load configuration with `path` as the TOML layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if a
    /// value has the wrong type.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let config = Self::figment(Some(path))
            .extract()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        log::debug!("Loaded configuration (file: {})", path.display());
        Ok(config)
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Write the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    ///
    /// # Errors
    ///
    /// Fails when no home directory can be determined.
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "capdeck", "capdeck")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line overrides.
    pub fn merge_cli(&mut self, cli: &CliOverrides) {
        if cli.recursive {
            self.recursive = true;
        }
        if let Some(sort) = cli.sort {
            self.sort = sort;
        }
        if let Some(path) = &cli.cache_path {
            self.cache_path = Some(path.clone());
        }
    }

    /// Scanner settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            recursive: self.recursive,
            skip_hidden: self.skip_hidden,
            follow_symlinks: self.follow_symlinks,
            extensions: self
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Resolve an application alias, falling back to the name itself.
    #[must_use]
    pub fn resolve_app<'a>(&'a self, alias: &'a str) -> &'a str {
        self.apps.get(alias).map_or(alias, String::as_str)
    }
}
