// mongoadmin-cli/src/config.rs
// mongoadmin.toml loading

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file read when neither `--config` nor `MONGOADMIN_CONFIG` is set
pub const DEFAULT_CONFIG_FILE: &str = "mongoadmin.toml";

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "MONGOADMIN_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snapshot file holding the in-memory server between runs
    pub snapshot: PathBuf,
    /// Fallback filter when RUST_LOG is not set
    pub log_level: String,
    /// Query limit used when `--limit` is not given (0 = server default)
    pub default_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            snapshot: PathBuf::from("mongoadmin.snapshot"),
            log_level: "warn".to_string(),
            default_limit: 0,
        }
    }
}

/// Where to look for the config file: flag, then environment, then default
pub fn config_path(flag: Option<&Path>) -> PathBuf {
    match flag {
        Some(path) => path.to_path_buf(),
        None => std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE)),
    }
}

/// Read and parse `path`; `None` when the file does not exist
pub fn load(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(Some(config))
}
