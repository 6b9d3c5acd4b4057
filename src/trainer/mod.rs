use crate::{
    dataset::{Batch, Dataset},
    error::{DelayError, Result},
    loss::Loss,
    model::{ParamOps, SecondOrderModel, TrainableModel},
    optimizer::Optimizer,
    regularizers::Regularizer,
};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use tracing::debug;

/// Step halvings tried before a Newton iteration gives up on descent.
const MAX_STEP_HALVINGS: usize = 30;

/// Relative objective increase still accepted as descent (rounding).
const DESCENT_SLACK: f64 = 1e-12;

/// How [`Trainer`] computes its update direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    /// Damped Newton steps over the full dataset ([`Trainer::fit_second_order`]).
    #[default]
    Newton,
    /// First-order minibatch updates ([`Trainer::fit`]).
    GradientDescent,
}

/// Summary of a finished training loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainingReport {
    /// Passes over the dataset that were run.
    pub epochs: usize,
    /// Mean loss (data term plus penalty) of the last epoch.
    pub final_loss: f64,
    /// Whether the gradient norm dropped below the tolerance before `max_epochs`.
    pub converged: bool,
}

/// Orchestrates the training loop for a [`TrainableModel`].
///
/// Combines a loss function, optimizer and regularizer. Once built via
/// [`TrainerBuilder`] it is immutable and can be reused across models.
pub struct Trainer<L, O, M, R>
where
    L: Loss,
    M: TrainableModel,
    O: Optimizer<M::Params>,
    R: Regularizer<M>,
{
    pub(crate) batch_size: usize,
    pub(crate) max_epochs: usize,
    pub(crate) tolerance: Option<f64>,
    pub(crate) verbose: bool,
    pub(crate) loss_fn: L,
    pub(crate) optimizer: O,
    pub(crate) regularizer: R,
    _phantom_model: PhantomData<M>,
}

/// Fluent builder for [`Trainer`].
///
/// Defaults:
/// - `batch_size`: 32
/// - `max_epochs`: 1000
/// - `tolerance`: none (always run `max_epochs`)
/// - `verbose`: true
pub struct TrainerBuilder<L, O, M, R>
where
    L: Loss,
    M: TrainableModel,
    O: Optimizer<M::Params>,
    R: Regularizer<M>,
{
    batch_size: usize,
    max_epochs: usize,
    tolerance: Option<f64>,
    verbose: bool,
    loss_fn: L,
    optimizer: O,
    regularizer: R,
    _phantom_model: PhantomData<M>,
}

impl<L, O, M, R> TrainerBuilder<L, O, M, R>
where
    L: Loss,
    M: TrainableModel,
    O: Optimizer<M::Params>,
    R: Regularizer<M>,
{
    pub fn new(loss_fn: L, optimizer: O, regularizer: R) -> Self {
        Self {
            batch_size: 32,
            max_epochs: 1000,
            tolerance: None,
            verbose: true,
            loss_fn,
            optimizer,
            regularizer,
            _phantom_model: PhantomData,
        }
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn max_epochs(mut self, epochs: usize) -> Self {
        self.max_epochs = epochs;
        self
    }

    /// Stops early once the norm of a batch gradient falls below `tol`.
    pub fn tolerance(mut self, tol: f64) -> Self {
        self.tolerance = Some(tol);
        self
    }

    /// When `false`, suppresses the per-epoch debug events.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Trainer<L, O, M, R> {
        Trainer {
            batch_size: self.batch_size,
            max_epochs: self.max_epochs,
            tolerance: self.tolerance,
            verbose: self.verbose,
            loss_fn: self.loss_fn,
            optimizer: self.optimizer,
            regularizer: self.regularizer,
            _phantom_model: PhantomData,
        }
    }
}

impl<L, O, M, R, P> Trainer<L, O, M, R>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
    P: ParamOps,
{
    /// Starts the builder pattern. Equivalent to `TrainerBuilder::new(...)`.
    pub fn builder(loss_fn: L, optimizer: O, regularizer: R) -> TrainerBuilder<L, O, M, R> {
        TrainerBuilder::new(loss_fn, optimizer, regularizer)
    }

    /// Trains `model` on `dataset` for at most `max_epochs` passes.
    ///
    /// # Errors
    /// [`DelayError::InvalidInput`] if the dataset is empty, its length is
    /// unknown, or a batch fails to load.
    pub fn fit<D>(&self, mut model: M, dataset: &D) -> Result<(M::Output, TrainingReport)>
    where
        D: Dataset,
    {
        let n_total = dataset
            .len()
            .ok_or_else(|| DelayError::InvalidInput("Dataset length unknown".into()))?;
        if n_total == 0 {
            return Err(DelayError::InvalidInput("Dataset is empty".into()));
        }

        let mut report = TrainingReport {
            epochs: 0,
            final_loss: f64::NAN,
            converged: false,
        };

        for epoch in 0..self.max_epochs {
            let mut total_loss = 0.0;
            let mut n_batches = 0usize;
            let mut grad_norm = f64::INFINITY;

            for batch in dataset.batches(self.batch_size) {
                let batch =
                    batch.map_err(|e| DelayError::InvalidInput(format!("Data error: {:?}", e)))?;
                let preds = model.forward(&batch.x);
                let (penalty, reg_grad) = self.regularizer.penalty_grad(&model);
                total_loss += self.loss_fn.loss(&preds, &batch.y, &batch.sample_weight) + penalty;

                let grad_preds =
                    self.loss_fn
                        .grad_wrt_prediction(&preds, &batch.y, &batch.sample_weight);
                let grads = model.backward(&batch.x, &grad_preds).add(&reg_grad);
                grad_norm = grads.norm();

                let new_params = self.optimizer.step(model.params(), &grads);
                model.update_params(&new_params);
                n_batches += 1;
            }

            report.epochs = epoch + 1;
            report.final_loss = total_loss / n_batches.max(1) as f64;
            if self.verbose {
                debug!(epoch, loss = report.final_loss, grad_norm, "epoch finished");
            }

            if let Some(tol) = self.tolerance {
                if grad_norm < tol {
                    report.converged = true;
                    break;
                }
            }
        }

        Ok((model.into_fitted(), report))
    }

    /// Trains `model` with damped Newton steps over the whole dataset.
    ///
    /// The solved direction is handed to the optimizer in place of the
    /// gradient, so with [`SGD`](crate::optimizer::SGD) the learning rate
    /// scales the step (1.0 is a full Newton step). A step is halved until
    /// the objective stops increasing. `batch_size` is ignored.
    ///
    /// # Errors
    /// Same as [`Trainer::fit`], plus [`DelayError::InvalidInput`] when the
    /// Newton system is singular.
    pub fn fit_second_order<D>(
        &self,
        mut model: M,
        dataset: &D,
    ) -> Result<(M::Output, TrainingReport)>
    where
        D: Dataset,
        M: SecondOrderModel,
    {
        let n_total = dataset
            .len()
            .ok_or_else(|| DelayError::InvalidInput("Dataset length unknown".into()))?;
        if n_total == 0 {
            return Err(DelayError::InvalidInput("Dataset is empty".into()));
        }
        let batch = dataset
            .get_batch(0..n_total)
            .map_err(|e| DelayError::InvalidInput(format!("Data error: {:?}", e)))?;

        let mut report = TrainingReport {
            epochs: 0,
            final_loss: self.objective(&model, &batch),
            converged: false,
        };

        for iteration in 0..self.max_epochs {
            let preds = model.forward(&batch.x);
            let (_, reg_grad) = self.regularizer.penalty_grad(&model);
            let grad_preds =
                self.loss_fn
                    .grad_wrt_prediction(&preds, &batch.y, &batch.sample_weight);
            let grads = model.backward(&batch.x, &grad_preds).add(&reg_grad);
            let grad_norm = grads.norm();

            if let Some(tol) = self.tolerance {
                if grad_norm < tol {
                    report.converged = true;
                    break;
                }
            }

            let hess_preds =
                self.loss_fn
                    .hess_wrt_prediction(&preds, &batch.y, &batch.sample_weight);
            let curvature = self.regularizer.penalty_curvature(&model);
            let direction = model
                .newton_direction(&batch.x, &grads, &hess_preds, &curvature)
                .ok_or_else(|| DelayError::InvalidInput("Newton system is singular".into()))?;

            let start = model.params().clone();
            let ceiling = report.final_loss + DESCENT_SLACK * report.final_loss.abs().max(1.0);
            let mut step_scale = 1.0;
            let mut accepted = None;
            for _ in 0..MAX_STEP_HALVINGS {
                let candidate = self.optimizer.step(&start, &direction.scale(step_scale));
                model.update_params(&candidate);
                let loss = self.objective(&model, &batch);
                if loss <= ceiling {
                    accepted = Some(loss);
                    break;
                }
                step_scale *= 0.5;
            }

            report.epochs = iteration + 1;
            let Some(loss) = accepted else {
                // No descent left at machine precision.
                model.update_params(&start);
                break;
            };
            report.final_loss = loss;
            if self.verbose {
                debug!(iteration, loss, grad_norm, step_scale, "newton step");
            }
        }

        Ok((model.into_fitted(), report))
    }

    /// Weighted data loss plus penalty at the current parameters.
    fn objective(&self, model: &M, batch: &Batch) -> f64 {
        let preds = model.forward(&batch.x);
        let (penalty, _) = self.regularizer.penalty_grad(model);
        self.loss_fn.loss(&preds, &batch.y, &batch.sample_weight) + penalty
    }
}
