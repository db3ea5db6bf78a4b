//! The TOG perturbation loop.

use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};
use rand::Rng;
use tog_core::{
    build_target, GeometryState, Image, ImageSource, Oracle, OracleError, Result, Target, TogError,
};

use crate::budget::IterationBudget;
use crate::config::TogConfig;
use crate::gradient::descend;
use crate::progress::ProgressTracker;
use crate::request::AttackRequest;
use crate::validation::{validate_config, validate_loss};

type Inner<B> = <B as AutodiffBackend>::InnerBackend;

/// How a run ended. Running out of budget is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The loss fell below the threshold of the attack type.
    Converged { iterations: usize },
    /// Every allowed iteration ran.
    BudgetExhausted { iterations: usize },
}

impl Termination {
    pub fn iterations(&self) -> usize {
        match *self {
            Self::Converged { iterations } | Self::BudgetExhausted { iterations } => iterations,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

/// Output of one attack invocation.
///
/// Both images have the shape and color order of the input image.
#[derive(Debug, Clone)]
pub struct AttackResult {
    pub adversarial: Image,
    /// Perturbation mapped back to pixels; negative components saturate to 0.
    pub noise: Image,
    /// Restored image after every iteration, only filled in debug mode.
    pub history: Vec<Image>,
    /// Loss of every completed iteration.
    pub losses: Vec<f32>,
    pub termination: Termination,
}

impl AttackResult {
    /// Loss observed in the last iteration, `None` if no iteration ran.
    pub fn final_loss(&self) -> Option<f32> {
        self.losses.last().copied()
    }
}

/// TOG attack engine.
///
/// Holds only immutable configuration; each call to [`Tog::run`] owns its
/// adversarial tensor, history and progress clock, so one engine can serve
/// many invocations.
///
/// # Type Parameters
/// * `B` - Autodiff backend the oracle runs on
#[derive(Debug, Clone)]
pub struct Tog<B: AutodiffBackend> {
    config: TogConfig,
    device: B::Device,
    progress: Option<ProgressTracker>,
}

impl<B: AutodiffBackend> Tog<B> {
    /// Create an engine.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `config` fails validation.
    pub fn new(config: TogConfig, device: B::Device) -> Result<Self> {
        validate_config(&config)?;
        Ok(Self {
            config,
            device,
            progress: None,
        })
    }

    /// Report every iteration to `tracker`.
    pub fn with_progress(mut self, tracker: ProgressTracker) -> Self {
        self.progress = Some(tracker);
        self
    }

    pub fn config(&self) -> &TogConfig {
        &self.config
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Letterbox `image` into the tensor the attack starts from.
    pub fn prepare(&self, image: &Image) -> (Tensor<Inner<B>, 4>, GeometryState) {
        self.config.letterbox.forward::<Inner<B>>(image, &self.device)
    }

    /// One descent step.
    ///
    /// # Returns
    /// The updated tensor, clamped to `[0, 1]`, and the loss of `x_adv`
    /// before the update.
    pub fn step<O: Oracle<B>>(
        &self,
        oracle: &O,
        x_adv: Tensor<Inner<B>, 4>,
        target: &Target,
    ) -> Result<(Tensor<Inner<B>, 4>, f32)> {
        let x = Tensor::<B, 4>::from_inner(x_adv.clone()).require_grad();
        let output = oracle.forward(x.clone())?;
        let loss = oracle.loss(output, target)?;

        let dims = loss.dims();
        if dims != [1] {
            return Err(OracleError::ShapeMismatch {
                expected: vec![1],
                actual: dims.to_vec(),
            }
            .into());
        }
        // backward on an untracked tensor panics inside the autodiff runtime
        if !loss.is_require_grad() {
            return Err(OracleError::DetachedInput.into());
        }
        let value = loss.clone().into_scalar().elem::<f32>();

        let grads = loss.backward();
        let gradient = x.grad(&grads).ok_or(OracleError::DetachedInput)?;

        let next = descend(x_adv, gradient, self.config.update_rule, self.config.epsilon);
        Ok((next, value))
    }

    /// Attack `image` toward `target`.
    ///
    /// # Errors
    /// Oracle failures pass through unchanged. A non-finite loss aborts with
    /// `NumericalInstability`. No partial result is returned.
    pub fn run<O: Oracle<B>>(
        &self,
        oracle: &O,
        image: &Image,
        budget: IterationBudget,
        target: &Target,
    ) -> Result<AttackResult> {
        let result = self.run_inner(oracle, image, budget, target);
        if let (Some(tracker), Err(err)) = (&self.progress, &result) {
            tracker.error(&err.to_string());
        }
        result
    }

    fn run_inner<O: Oracle<B>>(
        &self,
        oracle: &O,
        image: &Image,
        budget: IterationBudget,
        target: &Target,
    ) -> Result<AttackResult> {
        let attack_type = target.attack_type();
        let limit = budget.limit(self.config.max_iterations);
        let threshold = self.config.threshold(attack_type);
        let total = (!budget.stops_early()).then_some(limit);

        tracing::info!(
            "Starting {} attack on {}x{} image with {} ({} iterations, {} target boxes)",
            attack_type,
            image.height(),
            image.width(),
            oracle.name(),
            budget,
            target.len()
        );

        let (x_query, state) = self.prepare(image);
        let mut x_adv = x_query.clone();
        let mut losses = Vec::new();
        let mut history = Vec::new();
        let mut termination = Termination::BudgetExhausted { iterations: limit };

        let progress = self.progress.as_ref().map(ProgressTracker::start);

        for i in 0..limit {
            let (next, loss) = self.step(oracle, x_adv, target)?;
            validate_loss(loss, i + 1)?;
            x_adv = next;
            losses.push(loss);

            tracing::debug!("Iteration {}: loss {:.6}", i + 1, loss);
            if let Some(run) = &progress {
                run.update(i + 1, total, loss as f64);
            }

            if self.config.debug {
                history.push(self.restore(x_adv.clone(), &state, image)?);
            }

            if budget.stops_early() && loss < threshold {
                termination = Termination::Converged { iterations: i + 1 };
                break;
            }
        }

        match termination {
            Termination::Converged { iterations } => {
                tracing::info!(
                    "Converged after {} iterations (loss below {})",
                    iterations,
                    threshold
                )
            }
            Termination::BudgetExhausted { iterations } if budget.stops_early() => {
                tracing::warn!("No convergence within {} iterations", iterations)
            }
            Termination::BudgetExhausted { .. } => {}
        }

        let adversarial = self.restore(x_adv.clone(), &state, image)?;
        let noise = self.restore(x_adv - x_query, &state, image)?;

        let result = AttackResult {
            adversarial,
            noise,
            history,
            losses,
            termination,
        };

        if let Some(run) = &progress {
            let final_loss = result.final_loss().map_or(f64::NAN, f64::from);
            run.complete(termination.iterations(), final_loss);
        }

        Ok(result)
    }

    /// Build the target and run a full request on an image source.
    ///
    /// # Errors
    /// `InvalidImageSource` before the oracle is queried, plus everything
    /// [`build_target`] and [`Tog::run`] report.
    pub fn attack<O: Oracle<B>, R: Rng + ?Sized>(
        &self,
        oracle: &O,
        source: ImageSource,
        request: &AttackRequest,
        rng: &mut R,
    ) -> Result<AttackResult> {
        let image = Image::load(source)?;
        let target = build_target(request.attack_type, oracle.class_count(), &request.boxes, rng)?;
        self.run(oracle, &image, request.budget, &target)
    }

    fn restore(
        &self,
        tensor: Tensor<Inner<B>, 4>,
        state: &GeometryState,
        image: &Image,
    ) -> Result<Image> {
        let restored = self.config.letterbox.inverse(tensor, state.original)?;
        if restored.shape() != image.shape() {
            return Err(TogError::ShapeMismatch {
                expected: vec![image.height(), image.width()],
                actual: vec![restored.height(), restored.width()],
            });
        }
        Ok(restored.with_order(image.order()))
    }
}
