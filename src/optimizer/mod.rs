use crate::model::ParamOps;

pub mod newton;

/// Gradient-based parameter update rule.
///
/// The trainer owns the loop; optimizers only map `(params, gradients)` to new
/// parameters, so any model can be paired with any optimizer.
pub trait Optimizer<P> {
    /// Returns updated parameters without mutating the inputs.
    fn step(&self, params: &P, gradients: &P) -> P;
}

/// Plain (stochastic) gradient descent: `θ ← θ − η·∇L(θ)`.
///
/// Stateless: no momentum or adaptive rates.
#[derive(Clone, Copy, Debug)]
pub struct SGD {
    lr: f64,
}

impl SGD {
    pub fn new(lr: f64) -> Self {
        Self { lr }
    }

    pub fn learning_rate(&self) -> f64 {
        self.lr
    }
}

impl<P: ParamOps> Optimizer<P> for SGD {
    fn step(&self, params: &P, gradients: &P) -> P {
        params.add(&gradients.scale(-self.lr))
    }
}
