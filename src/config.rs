//! Handler configuration.
//!
//! Loaded from an optional `config.toml`. Every option has a default, so a
//! missing file is the same as an empty one, and user files only need the
//! values they want to override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [toolchain]
//! identify = "identify"        # Executable for inspect requests
//! convert = "convert"          # Executable for resize and convert requests
//!
//! [ephemeral]
//! # dir = "/tmp"               # Where input/output files live (omit for OS temp dir)
//! prefix = "imgop-"            # File name prefix for ephemeral files
//! default_extension = "png"    # Used when a request names no extension
//!
//! [resize]
//! thumbnail_width = 100        # Width used when a resize names no dimensions
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level handler configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandlerConfig {
    /// External executables.
    pub toolchain: ToolchainConfig,
    /// Ephemeral file placement and naming.
    pub ephemeral: EphemeralConfig,
    /// Resize defaults.
    pub resize: ResizeConfig,
}

impl HandlerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.toolchain.identify.trim().is_empty() {
            return Err(ConfigError::Validation(
                "toolchain.identify must not be empty".into(),
            ));
        }
        if self.toolchain.convert.trim().is_empty() {
            return Err(ConfigError::Validation(
                "toolchain.convert must not be empty".into(),
            ));
        }
        let ext = &self.ephemeral.default_extension;
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Validation(
                "ephemeral.default_extension must be non-empty ASCII alphanumerics".into(),
            ));
        }
        if self.ephemeral.prefix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "ephemeral.prefix must not contain path separators".into(),
            ));
        }
        if self.resize.thumbnail_width == 0 {
            return Err(ConfigError::Validation(
                "resize.thumbnail_width must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Names (or paths) of the ImageMagick executables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
    pub identify: String,
    pub convert: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            identify: "identify".to_string(),
            convert: "convert".to_string(),
        }
    }
}

/// Ephemeral file settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EphemeralConfig {
    /// Directory for input/output files. `None` means the OS temp dir.
    pub dir: Option<PathBuf>,
    pub prefix: String,
    pub default_extension: String,
}

impl EphemeralConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for EphemeralConfig {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: "imgop-".to_string(),
            default_extension: "png".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Width applied when a resize request sets neither width nor height.
    pub thumbnail_width: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            thumbnail_width: 100,
        }
    }
}

/// Load and validate the config at `path`, falling back to defaults when the
/// file does not exist.
pub fn load_config(path: &Path) -> Result<HandlerConfig, ConfigError> {
    if !path.exists() {
        return Ok(HandlerConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let config: HandlerConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// A documented `config.toml` with every option at its default.
pub fn stock_config_toml() -> &'static str {
    r#"# imgop configuration
# All options are optional. Values shown are the defaults.

[toolchain]
# Executable used for identify/getDimensions requests.
identify = "identify"
# Executable used for resize, thumbnail, convert and getSample requests.
convert = "convert"

[ephemeral]
# Directory for per-request input/output files. Omit to use the OS temp dir.
# dir = "/tmp"
# File name prefix; a random suffix keeps concurrent requests apart.
prefix = "imgop-"
# Extension used when a request sets no inputExtension/outputExtension.
default_extension = "png"

[resize]
# Width used when a resize request sets neither width nor height.
thumbnail_width = 100
"#
}
