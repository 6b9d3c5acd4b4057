use crate::model::{LogisticParams, LogisticRegression, TrainableModel};
use ndarray::Array1;

/// Weight penalty added to the training loss.
pub trait Regularizer<M: TrainableModel> {
    /// Returns the penalty value and its gradient w.r.t. the parameters.
    fn penalty_grad(&self, model: &M) -> (f64, M::Gradients);

    /// Diagonal of the penalty's Hessian, laid out like the parameters.
    fn penalty_curvature(&self, model: &M) -> M::Gradients;
}

/// Ridge penalty `λ·‖w‖²`. The intercept is not penalized.
#[derive(Clone, Copy, Debug)]
pub struct L2 {
    lambda: f64,
}

impl L2 {
    pub fn new(lambda: f64) -> Self {
        Self { lambda }
    }

    /// Penalty matching an inverse regularization strength `c` over
    /// `n_samples` rows when the data term is a mean: `λ = 1 / (2·c·n)`.
    pub fn from_inverse_strength(c: f64, n_samples: usize) -> Self {
        Self::new(1.0 / (2.0 * c * n_samples.max(1) as f64))
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

impl Regularizer<LogisticRegression> for L2 {
    fn penalty_grad(&self, model: &LogisticRegression) -> (f64, LogisticParams) {
        let w = &model.params().weights;
        let penalty = self.lambda * w.dot(w);
        let grad = LogisticParams {
            weights: w * (2.0 * self.lambda),
            bias: 0.0,
        };
        (penalty, grad)
    }

    fn penalty_curvature(&self, model: &LogisticRegression) -> LogisticParams {
        LogisticParams {
            weights: Array1::from_elem(model.params().weights.len(), 2.0 * self.lambda),
            bias: 0.0,
        }
    }
}

/// No penalty.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRegularizer;

impl Regularizer<LogisticRegression> for NoRegularizer {
    fn penalty_grad(&self, model: &LogisticRegression) -> (f64, LogisticParams) {
        (0.0, LogisticParams::zeros(model.params().weights.len()))
    }

    fn penalty_curvature(&self, model: &LogisticRegression) -> LogisticParams {
        LogisticParams::zeros(model.params().weights.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn model() -> LogisticRegression {
        LogisticRegression::from_params(LogisticParams {
            weights: array![1.0, -2.0],
            bias: 3.0,
        })
    }

    #[test]
    fn test_l2_penalty_and_gradient() {
        let (penalty, grad) = L2::new(0.5).penalty_grad(&model());
        assert_abs_diff_eq!(penalty, 2.5);
        assert_eq!(grad.weights, array![1.0, -2.0]);
        assert_eq!(grad.bias, 0.0);
    }

    #[test]
    fn test_l2_from_inverse_strength() {
        assert_abs_diff_eq!(L2::from_inverse_strength(1.0, 50).lambda(), 0.01);
    }

    #[test]
    fn test_l2_curvature_skips_intercept() {
        let curvature = L2::new(0.25).penalty_curvature(&model());
        assert_eq!(curvature.weights, array![0.5, 0.5]);
        assert_eq!(curvature.bias, 0.0);
    }

    #[test]
    fn test_no_regularizer() {
        let (penalty, grad) = NoRegularizer.penalty_grad(&model());
        assert_eq!(penalty, 0.0);
        assert_eq!(grad, LogisticParams::zeros(2));
        assert_eq!(NoRegularizer.penalty_curvature(&model()), LogisticParams::zeros(2));
    }
}
