// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;
use crate::errors::{PlandagError, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PLANDAG_CONFIG";

/// Load a configuration file from a given path and return the raw `ConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        PlandagError::ConfigError(format!("reading config file at {:?}: {e}", path))
    })?;

    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Resolve and load the effective configuration.
///
/// - An explicit path (CLI flag or `PLANDAG_CONFIG`) must exist.
/// - Otherwise `Plandag.toml` in the working directory is used if present,
///   and built-in defaults if not.
pub fn load_effective(explicit: Option<&Path>) -> Result<ConfigFile> {
    let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    if let Some(path) = explicit.map(Path::to_path_buf).or(env_path) {
        debug!(?path, "loading explicit config");
        return load_and_validate(path);
    }

    let path = default_config_path();
    if path.is_file() {
        debug!(?path, "loading default config");
        load_and_validate(path)
    } else {
        debug!("no config file found; using defaults");
        Ok(ConfigFile::default())
    }
}

/// Default config location: `Plandag.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Plandag.toml")
}
