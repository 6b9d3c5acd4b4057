//! Class-weighted delay classifier.
//!
//! Wraps a logistic regression over the fixed feature layout. A new
//! classifier is [`ClassifierState::Untrained`] and predicts 0 for every row;
//! each [`DelayClassifier::fit`] replaces the state with a freshly trained
//! model.

use crate::dataset::InMemoryDataset;
use crate::error::{DelayError, Result};
use crate::loss::BCEWithLogitsLoss;
use crate::model::logistic::{LogisticModel, LogisticRegression, SerializableLogisticParams};
use crate::model::{Fitted, InferenceModel};
use crate::optimizer::SGD;
use crate::preprocessing::{FeatureMatrix, Label, FEATURE_COLUMNS, N_FEATURES};
use crate::regularizers::L2;
use crate::serialization;
use crate::tracking::{self, NoopTracker, RunTracker, TrainingRun};
use crate::trainer::{Solver, Trainer, TrainingReport};
use chrono::Utc;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Identifier reported to the run tracker.
pub const MODEL_CLASS: &str = "LogisticRegression";

/// Per-class loss weights, inversely proportional to class frequency.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    /// Weight of label 0 (on time): share of delayed rows.
    pub negative: f64,
    /// Weight of label 1 (delayed): share of on-time rows.
    pub positive: f64,
}

impl ClassWeights {
    /// `positive = #0 / n`, `negative = #1 / n`.
    ///
    /// # Errors
    /// [`DelayError::InvalidInput`] for an empty slice or a label outside {0, 1}.
    pub fn from_labels(labels: &[Label]) -> Result<Self> {
        if labels.is_empty() {
            return Err(DelayError::InvalidInput("labels are empty".into()));
        }
        if let Some(bad) = labels.iter().find(|&&l| l > 1) {
            return Err(DelayError::InvalidInput(format!(
                "labels must be 0 or 1, got {bad}"
            )));
        }
        let total = labels.len() as f64;
        let n_delayed = labels.iter().filter(|&&l| l == 1).count() as f64;
        let n_on_time = total - n_delayed;
        Ok(Self {
            negative: n_delayed / total,
            positive: n_on_time / total,
        })
    }

    pub fn weight(&self, label: Label) -> f64 {
        if label == 1 {
            self.positive
        } else {
            self.negative
        }
    }
}

/// Hyperparameters of the logistic fit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    pub solver: Solver,
    /// Upper bound on full-batch solver iterations.
    pub max_iter: usize,
    /// Step scale; 1.0 is a full Newton step.
    pub learning_rate: f64,
    /// Inverse L2 regularization strength.
    pub c: f64,
    /// Gradient-norm threshold for early stopping.
    pub tol: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            solver: Solver::Newton,
            max_iter: 1000,
            learning_rate: 1.0,
            c: 1.0,
            tol: 1e-4,
        }
    }
}

/// Runtime state of a [`DelayClassifier`].
#[derive(Clone, Debug)]
pub enum ClassifierState {
    Untrained,
    Trained {
        model: LogisticModel<Fitted>,
        class_weights: ClassWeights,
    },
}

/// On-disk form of a trained classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct PersistedClassifier {
    feature_names: Vec<String>,
    params: SerializableLogisticParams,
    class_weights: ClassWeights,
}

/// Predicts whether a flight departs more than 15 minutes late.
///
/// `fit` needs `&mut self`; share a trained instance behind `Arc` for
/// concurrent prediction.
#[derive(Clone, Debug)]
pub struct DelayClassifier {
    state: ClassifierState,
    options: FitOptions,
    tracker: Arc<dyn RunTracker>,
}

impl Default for DelayClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayClassifier {
    /// Untrained classifier with default options and no run tracking.
    pub fn new() -> Self {
        Self {
            state: ClassifierState::Untrained,
            options: FitOptions::default(),
            tracker: Arc::new(NoopTracker),
        }
    }

    pub fn with_options(mut self, options: FitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn RunTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.state, ClassifierState::Trained { .. })
    }

    /// Class weights of the last fit.
    pub fn class_weights(&self) -> Option<ClassWeights> {
        match &self.state {
            ClassifierState::Trained { class_weights, .. } => Some(*class_weights),
            ClassifierState::Untrained => None,
        }
    }

    /// Fits the classifier, replacing any previous state.
    ///
    /// # Errors
    /// [`DelayError::InvalidInput`] when `features` and `labels` differ in
    /// length, are empty, contain a label outside {0, 1}, or hold a single
    /// class. The previous state is kept on error.
    pub fn fit(&mut self, features: &FeatureMatrix, labels: &[Label]) -> Result<()> {
        if features.n_rows() != labels.len() {
            return Err(DelayError::InvalidInput(format!(
                "features have {} rows but {} labels were given",
                features.n_rows(),
                labels.len()
            )));
        }
        let class_weights = ClassWeights::from_labels(labels)?;
        if class_weights.negative == 0.0 || class_weights.positive == 0.0 {
            return Err(DelayError::InvalidInput(
                "labels must contain both classes".into(),
            ));
        }

        let n_rows = labels.len();
        let y: Array1<f64> = labels.iter().map(|&l| f64::from(l)).collect();
        let sample_weight: Array1<f64> = labels.iter().map(|&l| class_weights.weight(l)).collect();
        let dataset =
            InMemoryDataset::with_sample_weight(features.view().to_owned(), y, sample_weight)?;

        let trainer = Trainer::builder(
            BCEWithLogitsLoss,
            SGD::new(self.options.learning_rate),
            L2::from_inverse_strength(self.options.c, n_rows),
        )
        .batch_size(n_rows)
        .max_epochs(self.options.max_iter)
        .tolerance(self.options.tol)
        .build();
        let initial = LogisticRegression::new(N_FEATURES);
        let (model, report) = match self.options.solver {
            Solver::Newton => trainer.fit_second_order(initial, &dataset)?,
            Solver::GradientDescent => trainer.fit(initial, &dataset)?,
        };

        info!(
            rows = n_rows,
            solver = ?self.options.solver,
            epochs = report.epochs,
            converged = report.converged,
            loss = report.final_loss,
            class_weight_0 = class_weights.negative,
            class_weight_1 = class_weights.positive,
            "delay classifier trained"
        );

        self.state = ClassifierState::Trained {
            model,
            class_weights,
        };
        self.emit_run(n_rows, class_weights, &report);
        Ok(())
    }

    /// 0/1 prediction per row, in input order. All zeros when untrained.
    pub fn predict(&self, features: &FeatureMatrix) -> Vec<Label> {
        match &self.state {
            ClassifierState::Untrained => vec![0; features.n_rows()],
            ClassifierState::Trained { model, .. } => model.predict_labels(features.view()),
        }
    }

    /// Delay probability per row. All zeros when untrained.
    pub fn predict_proba(&self, features: &FeatureMatrix) -> Vec<f64> {
        match &self.state {
            ClassifierState::Untrained => vec![0.0; features.n_rows()],
            ClassifierState::Trained { model, .. } => {
                model.predict_proba(features.view()).to_vec()
            }
        }
    }

    /// Writes the trained model, its feature names and class weights.
    ///
    /// # Errors
    /// [`DelayError::InvalidInput`] when the classifier is untrained.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let ClassifierState::Trained {
            model,
            class_weights,
        } = &self.state
        else {
            return Err(DelayError::InvalidInput(
                "cannot save an untrained classifier".into(),
            ));
        };
        let persisted = PersistedClassifier {
            feature_names: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            params: model.extract_params(),
            class_weights: *class_weights,
        };
        serialization::write_file(&persisted, path)
    }

    /// Restores a classifier written by [`Self::save_to_file`].
    ///
    /// # Errors
    /// [`DelayError::FeatureMismatch`] when the stored feature layout is not
    /// the current one.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let persisted: PersistedClassifier = serialization::read_file(path)?;

        let expected: Vec<String> = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
        let model = LogisticModel::<Fitted>::from_params(persisted.params)?;
        if persisted.feature_names != expected || model.n_features() != N_FEATURES {
            return Err(DelayError::FeatureMismatch {
                expected,
                got: persisted.feature_names,
            });
        }
        info!(path = %path.display(), "loaded delay classifier");
        Ok(Self {
            state: ClassifierState::Trained {
                model,
                class_weights: persisted.class_weights,
            },
            ..Self::new()
        })
    }

    fn emit_run(&self, n_rows: usize, class_weights: ClassWeights, report: &TrainingReport) {
        let run = TrainingRun {
            run_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            model_class: MODEL_CLASS.to_string(),
            n_features: N_FEATURES,
            n_rows,
            class_weight_0: class_weights.negative,
            class_weight_1: class_weights.positive,
            epochs: report.epochs,
            converged: report.converged,
        };
        tracking::record_best_effort(self.tracker.as_ref(), &run);
    }
}
