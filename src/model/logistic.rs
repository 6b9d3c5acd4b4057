//! Binary logistic regression with compile-time state tracking.
//!
//! - [`LogisticRegression`] = `LogisticModel<Unfitted>`: used during training,
//!   its forward pass returns logits `Xw + b`.
//! - [`LogisticModel<Fitted>`]: inference-only, serializable predictor.

use crate::error::{DelayError, Result};
use crate::model::{Fitted, InferenceModel, ParamOps, SecondOrderModel, TrainableModel, Unfitted};
use crate::optimizer::newton;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}

/// Trainable parameters: one weight per feature plus an intercept.
#[derive(Clone, Debug, PartialEq)]
pub struct LogisticParams {
    pub weights: Array1<f64>,
    pub bias: f64,
}

impl LogisticParams {
    pub fn zeros(n_features: usize) -> Self {
        Self {
            weights: Array1::zeros(n_features),
            bias: 0.0,
        }
    }
}

impl ParamOps for LogisticParams {
    fn add(&self, other: &Self) -> Self {
        Self {
            weights: &self.weights + &other.weights,
            bias: self.bias + other.bias,
        }
    }

    fn scale(&self, factor: f64) -> Self {
        Self {
            weights: &self.weights * factor,
            bias: self.bias * factor,
        }
    }

    fn norm(&self) -> f64 {
        (self.weights.dot(&self.weights) + self.bias * self.bias).sqrt()
    }
}

/// Plain-data form of [`LogisticParams`] for persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializableLogisticParams {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl From<&LogisticParams> for SerializableLogisticParams {
    fn from(params: &LogisticParams) -> Self {
        Self {
            weights: params.weights.to_vec(),
            bias: params.bias,
        }
    }
}

impl From<SerializableLogisticParams> for LogisticParams {
    fn from(value: SerializableLogisticParams) -> Self {
        Self {
            weights: Array1::from(value.weights),
            bias: value.bias,
        }
    }
}

/// Logistic model with its training state encoded in `S`.
#[derive(Clone, Debug)]
pub struct LogisticModel<S> {
    params: LogisticParams,
    _state: PhantomData<S>,
}

/// Alias for an unfitted logistic regression.
pub type LogisticRegression = LogisticModel<Unfitted>;

impl LogisticRegression {
    /// Zero-initialized model over `n_features` inputs.
    pub fn new(n_features: usize) -> Self {
        Self::from_params(LogisticParams::zeros(n_features))
    }

    /// Warm start from explicit parameters.
    pub fn from_params(params: LogisticParams) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }
}

impl LogisticModel<Fitted> {
    pub fn new(params: LogisticParams) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }

    pub fn params(&self) -> &LogisticParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.params.weights.len()
    }

    /// Probability of the positive class for every row.
    pub fn predict_proba(&self, input: ArrayView2<'_, f64>) -> Array1<f64> {
        self.predict_batch(input).mapv(sigmoid)
    }

    /// Hard 0/1 decision per row: 1 iff the logit is positive.
    pub fn predict_labels(&self, input: ArrayView2<'_, f64>) -> Vec<u8> {
        self.predict_batch(input)
            .iter()
            .map(|&z| u8::from(z > 0.0))
            .collect()
    }
}

/// Inference: `logit = w·x + b`.
impl InferenceModel for LogisticModel<Fitted> {
    type ParamsRepr = SerializableLogisticParams;

    fn predict(&self, input: ArrayView1<'_, f64>) -> f64 {
        self.params.weights.dot(&input) + self.params.bias
    }

    fn predict_batch(&self, input: ArrayView2<'_, f64>) -> Array1<f64> {
        input.dot(&self.params.weights) + self.params.bias
    }

    fn extract_params(&self) -> Self::ParamsRepr {
        (&self.params).into()
    }

    fn from_params(params: Self::ParamsRepr) -> Result<Self> {
        if params.weights.is_empty() {
            return Err(DelayError::Serialization(
                "logistic parameters have no weights".into(),
            ));
        }
        Ok(Self::new(params.into()))
    }
}

/// Training: forward returns logits, backward gives `∇w = Xᵀ·g`, `∇b = Σg`.
impl TrainableModel for LogisticRegression {
    type Params = LogisticParams;
    type Gradients = LogisticParams;
    type Output = LogisticModel<Fitted>;

    fn forward(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.params.weights) + self.params.bias
    }

    fn backward(&self, x: &Array2<f64>, grad_output: &Array1<f64>) -> Self::Gradients {
        LogisticParams {
            weights: x.t().dot(grad_output),
            bias: grad_output.sum(),
        }
    }

    fn params(&self) -> &Self::Params {
        &self.params
    }

    fn update_params(&mut self, params: &Self::Params) {
        self.params = params.clone();
    }

    fn into_fitted(self) -> LogisticModel<Fitted> {
        LogisticModel::<Fitted>::new(self.params)
    }
}

/// Newton system over `[w, b]`: the design matrix is `X` with a ones column.
impl SecondOrderModel for LogisticRegression {
    fn newton_direction(
        &self,
        x: &Array2<f64>,
        gradients: &LogisticParams,
        hess_output: &Array1<f64>,
        penalty_curvature: &LogisticParams,
    ) -> Option<LogisticParams> {
        let d = x.ncols();
        let weighted = x * &hess_output.view().insert_axis(Axis(1));
        let cross = weighted.sum_axis(Axis(0));

        let mut hessian = Array2::<f64>::zeros((d + 1, d + 1));
        hessian.slice_mut(s![..d, ..d]).assign(&x.t().dot(&weighted));
        hessian.slice_mut(s![..d, d]).assign(&cross);
        hessian.slice_mut(s![d, ..d]).assign(&cross);
        hessian[[d, d]] = hess_output.sum() + penalty_curvature.bias;
        for (j, c) in penalty_curvature.weights.iter().enumerate() {
            hessian[[j, j]] += c;
        }

        let mut rhs = Array1::<f64>::zeros(d + 1);
        rhs.slice_mut(s![..d]).assign(&gradients.weights);
        rhs[d] = gradients.bias;

        let step = newton::solve_spd(&hessian, &rhs)?;
        Some(LogisticParams {
            weights: step.slice(s![..d]).to_owned(),
            bias: step[d],
        })
    }
}
