//! Differentiable losses for training.

use crate::model::logistic::sigmoid;
use ndarray::{Array1, Zip};

/// A differentiable loss over raw model outputs.
///
/// Implementors provide the scalar loss (for logging and convergence
/// tracking) and its gradient w.r.t. the model output, which is passed to
/// the model's `backward()`.
pub trait Loss {
    /// Weighted mean loss over a batch.
    fn loss(&self, prediction: &Array1<f64>, target: &Array1<f64>, weight: &Array1<f64>) -> f64;

    /// ∂L/∂prediction for every sample.
    fn grad_wrt_prediction(
        &self,
        prediction: &Array1<f64>,
        target: &Array1<f64>,
        weight: &Array1<f64>,
    ) -> Array1<f64>;

    /// ∂²L/∂prediction² for every sample (the loss is separable, so this is
    /// the diagonal of its Hessian w.r.t. the outputs).
    fn hess_wrt_prediction(
        &self,
        prediction: &Array1<f64>,
        target: &Array1<f64>,
        weight: &Array1<f64>,
    ) -> Array1<f64>;
}

/// Sample-weighted binary cross-entropy on logits (numerically stable).
///
/// `L = (1/n) Σ sᵢ · (max(zᵢ, 0) − zᵢtᵢ + log(1 + e^{−|zᵢ|}))`
///
/// Gradient w.r.t. logits: `sᵢ · (σ(zᵢ) − tᵢ) / n`.
/// Curvature w.r.t. logits: `sᵢ · σ(zᵢ) · (1 − σ(zᵢ)) / n`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BCEWithLogitsLoss;

impl Loss for BCEWithLogitsLoss {
    fn loss(&self, logits: &Array1<f64>, targets: &Array1<f64>, weight: &Array1<f64>) -> f64 {
        let n = logits.len();
        if n == 0 {
            return 0.0;
        }
        let mut total = 0.0;
        Zip::from(logits)
            .and(targets)
            .and(weight)
            .for_each(|&z, &t, &s| {
                total += s * (z.max(0.0) - z * t + (-z.abs()).exp().ln_1p());
            });
        total / n as f64
    }

    fn grad_wrt_prediction(
        &self,
        logits: &Array1<f64>,
        targets: &Array1<f64>,
        weight: &Array1<f64>,
    ) -> Array1<f64> {
        let n = logits.len().max(1) as f64;
        Zip::from(logits)
            .and(targets)
            .and(weight)
            .map_collect(|&z, &t, &s| s * (sigmoid(z) - t) / n)
    }

    fn hess_wrt_prediction(
        &self,
        logits: &Array1<f64>,
        _targets: &Array1<f64>,
        weight: &Array1<f64>,
    ) -> Array1<f64> {
        let n = logits.len().max(1) as f64;
        Zip::from(logits).and(weight).map_collect(|&z, &s| {
            let p = sigmoid(z);
            s * p * (1.0 - p) / n
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_bce_with_logits_loss() {
        let logits = array![0.0, 2.0, -2.0];
        let targets = array![1.0, 1.0, 0.0];
        let ones = Array1::ones(3);

        let loss = BCEWithLogitsLoss.loss(&logits, &targets, &ones);
        // (ln 2 + 2·ln(1 + e⁻²)) / 3
        let expected = (2f64.ln() + 2.0 * (1.0 + (-2f64).exp()).ln()) / 3.0;
        assert_abs_diff_eq!(loss, expected, epsilon = 1e-12);

        let grad = BCEWithLogitsLoss.grad_wrt_prediction(&logits, &targets, &ones);
        let expected_grad = [
            (0.5 - 1.0) / 3.0,
            (sigmoid(2.0) - 1.0) / 3.0,
            sigmoid(-2.0) / 3.0,
        ];
        for (g, e) in grad.iter().zip(expected_grad.iter()) {
            assert_abs_diff_eq!(*g, *e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sample_weights_scale_contributions() {
        let logits = array![0.0, 0.0];
        let targets = array![1.0, 0.0];

        let grad = BCEWithLogitsLoss.grad_wrt_prediction(&logits, &targets, &array![0.8, 0.2]);
        assert_abs_diff_eq!(grad[0], 0.8 * -0.5 / 2.0);
        assert_abs_diff_eq!(grad[1], 0.2 * 0.5 / 2.0);

        let zero = BCEWithLogitsLoss.loss(&logits, &targets, &array![0.0, 0.0]);
        assert_eq!(zero, 0.0);
    }

    #[test]
    fn test_bce_curvature() {
        let logits = array![0.0, 3.0];
        let targets = array![1.0, 0.0];
        let weight = array![1.0, 0.5];
        let hess = BCEWithLogitsLoss.hess_wrt_prediction(&logits, &targets, &weight);
        assert_abs_diff_eq!(hess[0], 0.25 / 2.0);
        assert_abs_diff_eq!(hess[1], 0.5 * sigmoid(3.0) * sigmoid(-3.0) / 2.0, epsilon = 1e-12);

        let saturated =
            BCEWithLogitsLoss.hess_wrt_prediction(&array![800.0], &array![1.0], &array![1.0]);
        assert!(saturated[0] >= 0.0 && saturated[0].is_finite());
    }

    #[test]
    fn test_bce_numerical_stability() {
        let logits = array![100.0, -100.0];
        let targets = array![1.0, 0.0];
        let ones = Array1::ones(2);

        assert!(BCEWithLogitsLoss.loss(&logits, &targets, &ones).is_finite());
        let grad = BCEWithLogitsLoss.grad_wrt_prediction(&logits, &targets, &ones);
        assert!(grad.iter().all(|g| g.is_finite()));
    }
}
