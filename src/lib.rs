//! Flight delay prediction.
//!
//! Turns historical flight records into a fixed ten-column one-hot feature
//! layout, fits a class-weighted logistic regression that predicts whether a
//! departure is more than 15 minutes late, and serves predictions over HTTP.
//!
//! Building blocks:
//! - [`preprocessing`]: [`FeatureBuilder`] and the derived calendar columns.
//! - [`model`]: [`DelayClassifier`] on top of a typestate logistic model.
//! - [`trainer`], [`loss`], [`optimizer`], [`regularizers`]: the Newton and
//!   gradient descent loops the classifier is fitted with.
//! - [`dataset`]: CSV loading, in-memory batches and train/test split.
//! - [`api`]: axum router with reference-value validation.
//! - [`tracking`]: best-effort training run records.

pub mod api;
pub mod config;
pub mod dataset;
pub mod error;
pub mod loss;
pub mod metrics;
pub mod model;
pub mod optimizer;
pub mod preprocessing;
pub mod regularizers;
pub mod serialization;
pub mod tracking;
pub mod trainer;

pub use config::AppConfig;
pub use error::{DelayError, Result};
pub use metrics::ClassificationReport;
pub use model::{ClassWeights, ClassifierState, DelayClassifier};
pub use preprocessing::{FeatureBuilder, FeatureMatrix, FlightRecord, Label, FEATURE_COLUMNS};
pub use tracking::{JsonlTracker, NoopTracker, RunTracker, TrainingRun};
