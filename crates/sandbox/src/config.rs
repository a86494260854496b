use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

pub const CONFIG_ENV_VAR: &str = "SANDBOX_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "sandbox.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    pub frames: u64,
    pub target_tps: u32,
    pub max_ticks_per_iteration: u32,
    pub metrics_log_interval_ms: u64,
    pub realtime: bool,
    pub asset_dir: PathBuf,
    pub preload: Vec<PathBuf>,
    pub spawn: Vec<SpawnEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpawnEntry {
    pub kind: String,
    #[serde(default = "default_spawn_count")]
    pub count: u32,
}

fn default_spawn_count() -> u32 {
    1
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            frames: 300,
            target_tps: 60,
            max_ticks_per_iteration: 5,
            metrics_log_interval_ms: 1000,
            realtime: true,
            asset_dir: PathBuf::from("assets"),
            preload: Vec::new(),
            spawn: vec![
                SpawnEntry {
                    kind: "counter".to_string(),
                    count: 2,
                },
                SpawnEntry {
                    kind: "drift".to_string(),
                    count: 3,
                },
                SpawnEntry {
                    kind: "trail".to_string(),
                    count: 1,
                },
                SpawnEntry {
                    kind: "noop".to_string(),
                    count: 1,
                },
            ],
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path} at {location}: {source}")]
    Parse {
        path: PathBuf,
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

pub fn load_from_env() -> Result<DriverConfig, ConfigError> {
    let path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    load(&path)
}

/// Loads the driver config; a missing file falls back to defaults, any
/// other failure is an error that names the offending JSON path.
pub fn load(path: &Path) -> Result<DriverConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "config_missing_using_defaults");
            return Ok(DriverConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let location = error.path().to_string();
        ConfigError::Parse {
            path: path.to_path_buf(),
            location,
            source: error.into_inner(),
        }
    })
}
