//! Experiment tracking for training runs.
//!
//! Training reports each fit through a [`RunTracker`]. The default
//! [`NoopTracker`] records nothing; [`JsonlTracker`] appends one JSON line
//! per run to a local file. Tracking is best effort: [`record_best_effort`]
//! logs and drops any failure so a fit never fails because of its sink.

use crate::config::TrackingConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Parameters of one completed fit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingRun {
    pub run_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub model_class: String,
    pub n_features: usize,
    pub n_rows: usize,
    pub class_weight_0: f64,
    pub class_weight_1: f64,
    pub epochs: usize,
    pub converged: bool,
}

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("tracking I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("tracking serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Sink for labeled training runs.
pub trait RunTracker: Send + Sync + Debug {
    fn record_run(&self, run: &TrainingRun) -> Result<(), TrackingError>;
}

/// Tracker that discards every run.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTracker;

impl RunTracker for NoopTracker {
    fn record_run(&self, _run: &TrainingRun) -> Result<(), TrackingError> {
        Ok(())
    }
}

/// Appends runs as JSON lines to a file, creating parent directories as needed.
#[derive(Clone, Debug)]
pub struct JsonlTracker {
    path: PathBuf,
}

impl JsonlTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunTracker for JsonlTracker {
    fn record_run(&self, run: &TrainingRun) -> Result<(), TrackingError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_vec(run)?;
        line.push(b'\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        Ok(())
    }
}

/// Builds the tracker selected by configuration.
pub fn from_config(config: &TrackingConfig) -> Arc<dyn RunTracker> {
    if config.enabled {
        debug!(path = %config.path.display(), "run tracking enabled");
        Arc::new(JsonlTracker::new(config.path.clone()))
    } else {
        Arc::new(NoopTracker)
    }
}

/// Records `run`, logging and discarding any failure.
pub fn record_best_effort(tracker: &dyn RunTracker, run: &TrainingRun) {
    if let Err(err) = tracker.record_run(run) {
        warn!(run_id = %run.run_id, error = %err, "failed to record training run");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run() -> TrainingRun {
        TrainingRun {
            run_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            model_class: "LogisticRegression".to_string(),
            n_features: 10,
            n_rows: 100,
            class_weight_0: 0.2,
            class_weight_1: 0.8,
            epochs: 1000,
            converged: false,
        }
    }

    #[derive(Debug)]
    struct FailingTracker;

    impl RunTracker for FailingTracker {
        fn record_run(&self, _run: &TrainingRun) -> Result<(), TrackingError> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "sink down").into())
        }
    }

    #[test]
    fn test_jsonl_tracker_appends_lines() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let tracker = JsonlTracker::new(dir.path().join("runs").join("tracking.jsonl"));

        let first = run();
        tracker.record_run(&first)?;
        tracker.record_run(&run())?;

        let contents = fs::read_to_string(tracker.path())?;
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: TrainingRun = serde_json::from_str(lines[0])?;
        assert_eq!(parsed, first);
        Ok(())
    }

    #[test]
    fn test_jsonl_tracker_unwritable_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = JsonlTracker::new(dir.path());
        assert!(tracker.record_run(&run()).is_err());
    }

    #[test]
    fn test_record_best_effort_swallows_errors() {
        record_best_effort(&FailingTracker, &run());
    }

    #[test]
    fn test_from_config() {
        let disabled = TrackingConfig::default();
        assert!(format!("{:?}", from_config(&disabled)).contains("NoopTracker"));

        let enabled = TrackingConfig {
            enabled: true,
            ..TrackingConfig::default()
        };
        assert!(format!("{:?}", from_config(&enabled)).contains("JsonlTracker"));
    }
}
