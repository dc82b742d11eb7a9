//! Configuration module.
//!
//! Handles loading, validating, and merging `image-compressor.toml`. Stock
//! defaults are overridden by whatever the user file sets; everything is
//! optional.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [conversion]
//! output_type = "image/webp"  # Target MIME type (webp, jpeg, png, x-icon)
//! compression = 0.5           # 0.0 (strongest) to 1.0 (off)
//!
//! [download]
//! directory = "."             # Where converted files are saved
//!
//! [server]
//! bind = "127.0.0.1"          # IPv4/IPv6 literal or host name
//! port = 3000
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::media_type::MediaType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
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

/// Configuration loaded from `image-compressor.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Conversion defaults (target type, compression).
    pub conversion: ConversionConfig,
    /// Where converted files land.
    pub download: DownloadConfig,
    /// Passthrough server settings.
    pub server: ServerConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if MediaType::from_mime(&self.conversion.output_type).is_none() {
            return Err(ConfigError::Validation(format!(
                "conversion.output_type must be one of: {}",
                MediaType::all()
                    .map(MediaType::mime)
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        if !(0.0..=1.0).contains(&self.conversion.compression) {
            return Err(ConfigError::Validation(
                "conversion.compression must be 0.0-1.0".into(),
            ));
        }
        if self.download.directory.is_empty() {
            return Err(ConfigError::Validation(
                "download.directory must not be empty".into(),
            ));
        }
        if self.server.bind.is_empty() {
            return Err(ConfigError::Validation(
                "server.bind must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    /// Target MIME type when none is given on the command line.
    pub output_type: String,
    /// Compression level, 0.0 to 1.0. Exactly 1.0 disables compression.
    pub compression: f32,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            output_type: "image/webp".to_string(),
            compression: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfig {
    pub directory: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(AppConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse config text on top of the stock defaults, then validate.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let merged = merge_toml(stock_defaults_value()?, overlay);
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`.
///
/// A missing file yields the validated stock defaults. A file that exists but
/// is invalid TOML or fails validation is an error.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        let config = AppConfig::default();
        config.validate()?;
        return Ok(config);
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# image-compressor configuration
# ==============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Conversion
# ---------------------------------------------------------------------------
[conversion]
# Target MIME type when --to is not given.
# One of: image/webp, image/jpeg, image/png, image/x-icon
output_type = "image/webp"

# Compression level from 0.0 (strongest) to 1.0 (disabled).
compression = 0.5

# ---------------------------------------------------------------------------
# Download
# ---------------------------------------------------------------------------
[download]
# Directory converted files are saved into.
directory = "."

# ---------------------------------------------------------------------------
# Passthrough server (`image-compressor serve`)
# ---------------------------------------------------------------------------
[server]
bind = "127.0.0.1"
port = 3000
"##
}
