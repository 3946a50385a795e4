//! Configuration file support for feedsieve
//!
//! Loads `.feedsieve.toml` from current directory or parent directories.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = ".feedsieve.toml";

/// Debounce used by watch mode when the config does not set one
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub output: OutputConfig,
    pub watch: WatchConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store file; relative paths are resolved against the config file's directory
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text" or "json"
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub debounce_ms: Option<u64>,
}

impl Config {
    /// Load config from `.feedsieve.toml` searching from current directory upward
    pub fn load() -> Result<Option<(Config, PathBuf)>> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(Config, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if let (Some(store), Some(base)) = (&config.store.path, path.parent()) {
            if store.is_relative() {
                config.store.path = Some(base.join(store));
            }
        }
        Ok(config)
    }

    /// Store file to use: the CLI override, then the config, then the
    /// per-user data directory
    pub fn store_path(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = cli_override {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = &self.store.path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .context("Could not determine a data directory; pass --store or set [store] path")?;
        Ok(data_dir.join("feedsieve").join("store.json"))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS))
    }
}
