//! Configuration module for widgets-rs
//!
//! Settings control how programs are generated and how much work a Rhai hook
//! or program may do. They live in a TOML file, by default under the
//! platform configuration directory:
//!
//! - **Linux**: `~/.config/widgets-rs/settings.toml`
//! - **macOS**: `~/Library/Application Support/widgets-rs/settings.toml`
//! - **Windows**: `%APPDATA%\widgets-rs\settings.toml`
//!
//! Every field has a default, so a partial (or empty) file is valid.
//!
//! # Example
//!
//! ```ignore
//! use widgets_rs::config::Settings;
//!
//! let settings = Settings::load_or_default(Settings::default_path());
//! assert_eq!(settings.compiler.indent, 4);
//! ```

use crate::error::{Result, WidgetError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for configuration directories
pub const APP_ID: &str = "widgets-rs";

/// Settings filename
pub const SETTINGS_FILE: &str = "settings.toml";

/// Header written at the top of every generated program
pub const DEFAULT_HEADER: &str =
    "Generated by widgets-rs. Evaluating this script rebuilds the resource tree.";

/// Get the platform configuration directory for widgets-rs
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// All settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub compiler: CompilerSettings,

    #[serde(default)]
    pub scripting: ScriptLimits,
}

impl Settings {
    /// Default settings file location, if a config directory exists
    pub fn default_path() -> Option<PathBuf> {
        config_dir().map(|p| p.join(SETTINGS_FILE))
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            WidgetError::Configuration(format!("Failed to read settings {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            WidgetError::Configuration(format!("Failed to parse settings {:?}: {}", path, e))
        })
    }

    /// Load settings, falling back to defaults when the file is missing or invalid
    pub fn load_or_default(path: Option<impl AsRef<Path>>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save settings as TOML, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            WidgetError::Serialization(format!("Failed to serialize settings: {}", e))
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// How generated programs are laid out and checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerSettings {
    /// Spaces per nesting level
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Characters that may not appear anywhere in generated source.
    /// The backtick is reserved by the HTML page that embeds programs.
    #[serde(default = "default_reserved_delimiters")]
    pub reserved_delimiters: Vec<char>,

    /// Comment written at the top of each program
    #[serde(default = "default_header")]
    pub header: String,
}

fn default_indent() -> usize {
    4
}

fn default_reserved_delimiters() -> Vec<char> {
    vec!['`']
}

fn default_header() -> String {
    DEFAULT_HEADER.to_string()
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            reserved_delimiters: default_reserved_delimiters(),
            header: default_header(),
        }
    }
}

/// Safety limits applied to every Rhai engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLimits {
    #[serde(default = "default_max_operations")]
    pub max_operations: u64,

    #[serde(default = "default_max_call_levels")]
    pub max_call_levels: usize,

    #[serde(default = "default_max_expr_depth")]
    pub max_expr_depth: usize,

    /// Expression depth for generated programs, which nest one call per
    /// tree level. 0 lifts the limit.
    #[serde(default)]
    pub max_program_depth: usize,

    #[serde(default = "default_max_string_size")]
    pub max_string_size: usize,

    #[serde(default = "default_max_array_size")]
    pub max_array_size: usize,

    #[serde(default = "default_max_map_size")]
    pub max_map_size: usize,
}

fn default_max_operations() -> u64 {
    100_000
}

fn default_max_call_levels() -> usize {
    32
}

fn default_max_expr_depth() -> usize {
    64
}

fn default_max_string_size() -> usize {
    1_000_000
}

fn default_max_array_size() -> usize {
    100_000
}

fn default_max_map_size() -> usize {
    10_000
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: default_max_operations(),
            max_call_levels: default_max_call_levels(),
            max_expr_depth: default_max_expr_depth(),
            max_program_depth: 0,
            max_string_size: default_max_string_size(),
            max_array_size: default_max_array_size(),
            max_map_size: default_max_map_size(),
        }
    }
}
