//! Models and the traits the trainer drives them through.
//!
//! - [`logistic`]: typestate logistic regression (`Unfitted` → `Fitted`).
//! - [`classifier`]: [`DelayClassifier`], the class-weighted delay predictor
//!   with an explicit `Untrained | Trained` runtime state.

use crate::error::Result;
use crate::serialization::{self, SerializableParams};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub mod classifier;
pub mod logistic;
pub mod state;

pub use classifier::{ClassWeights, ClassifierState, DelayClassifier};
pub use logistic::{LogisticModel, LogisticParams, LogisticRegression};
pub use state::{Fitted, Unfitted};

/// A model in its training phase.
pub trait TrainableModel {
    type Params;
    type Gradients;
    type Output;

    /// Raw model output for every row of `x`.
    fn forward(&self, x: &Array2<f64>) -> Array1<f64>;

    /// Gradients of the loss w.r.t. the parameters, given ∂L/∂output.
    fn backward(&self, x: &Array2<f64>, grad_output: &Array1<f64>) -> Self::Gradients;

    fn params(&self) -> &Self::Params;

    fn update_params(&mut self, new_params: &Self::Params);

    /// Drops training state and returns the inference model.
    fn into_fitted(self) -> Self::Output;
}

/// A trainable model whose Newton step can be solved in closed form.
pub trait SecondOrderModel: TrainableModel {
    /// Solves `H·Δ = g` for the step `Δ`, where `H = Jᵀ·diag(hess_output)·J`
    /// plus `penalty_curvature` on the diagonal and `J` is ∂output/∂params.
    ///
    /// `None` when the system cannot be solved.
    fn newton_direction(
        &self,
        x: &Array2<f64>,
        gradients: &Self::Gradients,
        hess_output: &Array1<f64>,
        penalty_curvature: &Self::Gradients,
    ) -> Option<Self::Gradients>;
}

/// Arithmetic on parameter sets, used by optimizers.
pub trait ParamOps: Clone {
    fn add(&self, other: &Self) -> Self;
    fn scale(&self, factor: f64) -> Self;
    /// Euclidean norm over every parameter.
    fn norm(&self) -> f64;
}

/// A trained model ready for prediction and persistence.
pub trait InferenceModel {
    type ParamsRepr: SerializableParams;

    fn predict(&self, input: ArrayView1<'_, f64>) -> f64;

    fn predict_batch(&self, input: ArrayView2<'_, f64>) -> Array1<f64>;

    fn extract_params(&self) -> Self::ParamsRepr;

    fn from_params(params: Self::ParamsRepr) -> Result<Self>
    where
        Self: Sized;

    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        serialization::write_file(&self.extract_params(), path)
    }

    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self>
    where
        Self: Sized,
    {
        Self::from_params(serialization::read_file(path)?)
    }
}
