// Configuration for the tasklist binary

use crate::store::StoreOptions;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "tasklist";

/// Settings read from `config.yaml`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Location of the persisted task list
    pub storage_path: PathBuf,
    /// Maximum undo depth; absent means unbounded
    pub history_limit: Option<usize>,
    /// Pretty-print the state file
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            history_limit: None,
            pretty: true,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!(file = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).wrap_err_with(|| format!("Failed to read config file {:?}", path))?;
        let config: Config = serde_yaml::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse config file {:?}", path))?;
        debug!(file = ?path, ?config, "Loaded config");
        Ok(config)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            history_limit: self.history_limit,
            pretty: self.pretty,
        }
    }
}

/// `<config dir>/tasklist/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.yaml"))
}

/// `<data dir>/tasklist/tasks.json`, or `tasks.json` in the working directory
pub fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR).join("tasks.json"))
        .unwrap_or_else(|| PathBuf::from("tasks.json"))
}
