//! Configuration system for yamlreplace.
//!
//! Settings are read from `~/.config/yamlreplace/config.toml`. Every field
//! has a default, so a missing file, a missing field or an unreadable file
//! all fall back to the built-in values.
//!
//! # Example
//!
//! ```
//! use yamlreplace::config::Config;
//!
//! let config = Config::default();
//! assert_eq!(config.max_nesting_depth, 16);
//! assert_eq!(config.default_fieldref, "metadata.name");
//!
//! let custom = Config {
//!     create_backup: true,
//!     ..Config::default()
//! };
//! assert!(custom.create_backup);
//! ```

use crate::fieldpath::DEFAULT_MAX_DEPTH;
use crate::replacement::{ReplacerOptions, DEFAULT_FIELDREF};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for yamlreplace.
///
/// # Fields
///
/// * `max_nesting_depth` - Maximum number of documents-in-strings a field path may descend into (default: 16)
/// * `default_fieldref` - Field read from a source resource when a rule names none (default: "metadata.name")
/// * `create_backup` - Create .bak files before overwriting an output file (default: false)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    #[serde(default = "default_fieldref")]
    pub default_fieldref: String,

    /// Create .bak files before saving
    #[serde(default)]
    pub create_backup: bool,
}

fn default_max_nesting_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_fieldref() -> String {
    DEFAULT_FIELDREF.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_nesting_depth: default_max_nesting_depth(),
            default_fieldref: default_fieldref(),
            create_backup: false,
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/yamlreplace/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("yamlreplace");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Loads configuration from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid config file");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Options for building a [`Replacer`](crate::replacement::Replacer).
    pub fn replacer_options(&self) -> ReplacerOptions {
        ReplacerOptions {
            max_depth: self.max_nesting_depth,
            default_fieldref: self.default_fieldref.clone(),
        }
    }
}
