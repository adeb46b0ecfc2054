use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use scenario_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_DATA_DIR: &str = "SCENARIO_SIM_DATA_DIR";
pub const ENV_LOG: &str = "SCENARIO_SIM_LOG";
pub const ENV_SNAPSHOT_INTERVAL: &str = "SCENARIO_SIM_SNAPSHOT_INTERVAL";

/// Runtime settings. Every field is defaulted, so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Sessions, saves and run history live under this directory.
    pub data_dir: PathBuf,
    pub log_filter: String,
    /// Snapshot every N commands; 0 disables snapshots.
    pub snapshot_interval: u64,
    pub scenario_path: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./scenario-data"),
            log_filter: "info".to_string(),
            snapshot_interval: 10,
            scenario_path: None,
            engine: EngineConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{ENV_SNAPSHOT_INTERVAL} must be a non-negative integer, got {0:?}")]
    InvalidSnapshotInterval(String),
}

impl RuntimeConfig {
    /// Read `path` if given and present, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) if p.exists() => Self::from_file(p)?,
            _ => Self::default(),
        };
        config.with_overrides(|key| env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from `lookup`, which maps a variable name to its
    /// value.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }
        if let Some(raw) = lookup(ENV_SNAPSHOT_INTERVAL) {
            self.snapshot_interval = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidSnapshotInterval(raw.clone()))?;
        }
        Ok(self)
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    pub fn saves_path(&self) -> PathBuf {
        self.data_dir.join("saves.json")
    }

    pub fn runs_path(&self) -> PathBuf {
        self.data_dir.join("runs.json")
    }
}
