//! Service and training configuration.
//!
//! Loaded from a YAML file when one is given, otherwise defaults are used.
//! `FLIGHT_DELAY_TRACKING=1` turns run tracking on regardless of the file.

use crate::error::{DelayError, Result};
use crate::model::classifier::FitOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the config file path.
pub const CONFIG_ENV: &str = "FLIGHT_DELAY_CONFIG";

/// Environment toggle for run tracking (`1` enables).
pub const TRACKING_ENV: &str = "FLIGHT_DELAY_TRACKING";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    pub listen_addr: String,
    /// CSV with the observed `OPERA` / `TIPOVUELO` / `MES` values.
    pub reference_data: PathBuf,
    /// Fitted classifier to serve. When unset or missing, the service runs
    /// an untrained classifier that predicts 0 for every flight.
    pub model_path: Option<PathBuf>,
    pub training: FitOptions,
    pub tracking: TrackingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            reference_data: PathBuf::from("data/data.csv"),
            model_path: None,
            training: FitOptions::default(),
            tracking: TrackingConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub enabled: bool,
    /// JSON-lines file the runs are appended to.
    pub path: PathBuf,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("runs/tracking.jsonl"),
        }
    }
}

impl AppConfig {
    /// Parses a YAML document. Missing keys take their defaults.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Reads and parses a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DelayError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&contents)
    }

    /// Applies environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if std::env::var(TRACKING_ENV).is_ok_and(|v| v == "1") {
            self.tracking.enabled = true;
        }
        self
    }

    /// Loads from `path` (or `FLIGHT_DELAY_CONFIG`), falling back to defaults,
    /// then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let config = match path.map(Path::to_path_buf).or(from_env) {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }
}
