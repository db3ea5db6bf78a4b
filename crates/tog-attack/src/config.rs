//! Attack configuration.

use serde::{Deserialize, Serialize};
use tog_core::{AttackType, Letterbox};

/// How a gradient turns into a pixel update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum UpdateRule {
    /// Descend along the gradient scaled to unit L2 norm per sample.
    L2Normalized { step: f32 },
    /// Descend by `epsilon` along the sign of the gradient.
    Sign { epsilon: f32 },
}

impl Default for UpdateRule {
    fn default() -> Self {
        Self::L2Normalized { step: 1.0 }
    }
}

impl UpdateRule {
    /// Sign rule with the classic `2/255` step.
    pub fn sign() -> Self {
        Self::Sign { epsilon: 2.0 / 255.0 }
    }

    /// Step size of either rule.
    pub fn magnitude(&self) -> f32 {
        match *self {
            Self::L2Normalized { step } => step,
            Self::Sign { epsilon } => epsilon,
        }
    }
}

/// Configuration of a [`Tog`](crate::Tog) engine.
///
/// Immutable once the engine is built; per-run state lives in the invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TogConfig {
    /// Geometry applied before the first step and inverted afterwards.
    pub letterbox: Letterbox,
    /// Loss below which a vanishing attack counts as converged.
    pub vanishing_threshold: f32,
    /// Loss below which a fabrication attack counts as converged.
    pub fabrication_threshold: f32,
    /// Iteration ceiling when running until convergence.
    pub max_iterations: usize,
    /// Added to the gradient norm before normalizing.
    pub epsilon: f32,
    pub update_rule: UpdateRule,
    /// Keep the restored image of every iteration.
    pub debug: bool,
}

impl Default for TogConfig {
    fn default() -> Self {
        Self {
            letterbox: Letterbox::default(),
            vanishing_threshold: 0.1,
            fabrication_threshold: 0.1,
            max_iterations: 1000,
            epsilon: 1e-10,
            update_rule: UpdateRule::default(),
            debug: false,
        }
    }
}

impl TogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_letterbox(mut self, letterbox: Letterbox) -> Self {
        self.letterbox = letterbox;
        self
    }

    /// Set both convergence thresholds.
    pub fn with_thresholds(mut self, vanishing: f32, fabrication: f32) -> Self {
        self.vanishing_threshold = vanishing;
        self.fabrication_threshold = fabrication;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_update_rule(mut self, rule: UpdateRule) -> Self {
        self.update_rule = rule;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Convergence threshold for an attack type.
    pub fn threshold(&self, attack_type: AttackType) -> f32 {
        match attack_type {
            AttackType::Vanishing => self.vanishing_threshold,
            AttackType::Fabrication => self.fabrication_threshold,
        }
    }
}
