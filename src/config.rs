//! Launcher configuration.
//!
//! Settings are read once at session start from `config.toml` in the
//! platform config directory (`~/.config/sunbeam/config.toml` on Linux),
//! merged over stock defaults. The file is optional and sparse: override only
//! the keys you need. Unknown keys are rejected to catch typos early.
//!
//! ```toml
//! # Where scripts are discovered. SUNBEAM_SCRIPT_DIR takes precedence.
//! # script_dir = "/home/me/scripts"
//!
//! # Base for per-package support directories (default: platform data dir).
//! # data_dir = "/home/me/.local/share"
//!
//! [log]
//! level = "warn"     # tracing filter directive; RUST_LOG takes precedence
//! format = "text"    # "text" or "json"
//! ```
//!
//! ## Directory resolution
//!
//! The resolved [`Dirs`] value is threaded explicitly into discovery and
//! local commands:
//!
//! - scripts: `SUNBEAM_SCRIPT_DIR` → `script_dir` → data directory
//! - data: `data_dir` → platform data directory
//!
//! Interactive scripts get `SUNBEAM_SUPPORT_DIR` pointing at
//! `<data>/sunbeam/<package>/support`.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Overrides the script root.
pub const SCRIPT_DIR_ENV: &str = "SUNBEAM_SCRIPT_DIR";

/// Exported to interactive scripts.
pub const SUPPORT_DIR_ENV: &str = "SUNBEAM_SUPPORT_DIR";

const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("no data directory: set data_dir in config.toml")]
    NoDataDir,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Script root, unless overridden by `SUNBEAM_SCRIPT_DIR`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_dir: Option<PathBuf>,
    /// Base for support directories and the default script root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `tracing` filter directive, e.g. `"warn"` or `"sunbeam=debug"`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Directories resolved once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dirs {
    pub scripts: PathBuf,
    pub data: PathBuf,
}

impl Dirs {
    /// Support directory handed to interactive scripts of `package`.
    pub fn support_dir(&self, package: &str) -> PathBuf {
        self.data.join("sunbeam").join(package).join("support")
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if EnvFilter::try_new(&self.log.level).is_err() {
            return Err(ConfigError::Validation(format!(
                "log.level `{}` is not a valid filter",
                self.log.level
            )));
        }
        if self
            .script_dir
            .as_deref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(ConfigError::Validation(
                "script_dir must not be empty".into(),
            ));
        }
        if self
            .data_dir
            .as_deref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(ConfigError::Validation("data_dir must not be empty".into()));
        }
        Ok(())
    }

    /// Resolve directories from this config and the process environment.
    pub fn resolve_dirs(&self) -> Result<Dirs, ConfigError> {
        self.resolve_dirs_with(std::env::var_os(SCRIPT_DIR_ENV), dirs::data_dir())
    }

    fn resolve_dirs_with(
        &self,
        script_override: Option<OsString>,
        platform_data: Option<PathBuf>,
    ) -> Result<Dirs, ConfigError> {
        let data = self
            .data_dir
            .clone()
            .or(platform_data)
            .ok_or(ConfigError::NoDataDir)?;
        let scripts = script_override
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.script_dir.clone())
            .unwrap_or_else(|| data.clone());
        Ok(Dirs { scripts, data })
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Platform location of the config directory, if the platform has one.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sunbeam"))
}

/// Stock defaults as a `toml::Value::Table`, the base layer for merging.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
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

/// Load `config.toml` from `dir` as a raw TOML value, `None` if absent.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in `dir`, falling back to defaults.
pub fn load_config(dir: &Path) -> Result<Config, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Load config from the platform config directory, if there is one.
pub fn load_default_config() -> Result<Config, ConfigError> {
    match config_dir() {
        Some(dir) => load_config(&dir),
        None => Ok(Config::default()),
    }
}

/// A fully-commented stock `config.toml`, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Sunbeam Configuration
# =====================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Directory scanned for scripts. The SUNBEAM_SCRIPT_DIR environment
# variable takes precedence. Defaults to the platform data directory.
# script_dir = "~/.local/share"

# Base directory for per-package support directories handed to interactive
# scripts as SUNBEAM_SUPPORT_DIR (<data_dir>/sunbeam/<package>/support).
# Defaults to the platform data directory.
# data_dir = "~/.local/share"

# ---------------------------------------------------------------------------
# Logging (written to stderr)
# ---------------------------------------------------------------------------
[log]
# tracing filter directive; RUST_LOG takes precedence when set.
level = "warn"

# "text" or "json".
format = "text"
"##
}
