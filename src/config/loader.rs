// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::template::render_config;
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// The file is rendered as a template first (see [`render_config`]), then
/// deserialized. No semantic validation (DAG correctness, etc.) happens here;
/// use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;
    let rendered = render_config(&path.display().to_string(), &source)?;
    let config: RawConfigFile = toml::from_str(&rendered)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// Checks for:
/// - at least one job,
/// - a parseable `poll_interval`,
/// - non-empty, parseable scripts,
/// - unknown or self `depends_on` references and the reserved `start` id,
/// - DAG cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// `Dagrun.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Dagrun.toml")
}

/// Directory that relative paths in the config are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "flows/nightly.toml"),
///   that directory is used.
/// - For a bare filename ("Dagrun.toml") we fall back to the current working
///   directory.
pub fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
