//! Validation utilities for attack configuration and per-step values.

use tog_core::{Letterbox, Result, TogError};

use crate::config::{TogConfig, UpdateRule};

/// Validate a full engine configuration.
pub fn validate_config(config: &TogConfig) -> Result<()> {
    validate_letterbox(&config.letterbox)?;
    validate_threshold("vanishing", config.vanishing_threshold)?;
    validate_threshold("fabrication", config.fabrication_threshold)?;
    validate_iteration_ceiling(config.max_iterations)?;
    validate_update_rule(config.update_rule)?;

    if !(config.epsilon.is_finite() && config.epsilon > 0.0) {
        return Err(TogError::invalid_configuration(format!(
            "Norm epsilon must be positive, got {}",
            config.epsilon
        )));
    }

    Ok(())
}

/// Validate letterbox geometry.
pub fn validate_letterbox(letterbox: &Letterbox) -> Result<()> {
    let (h, w) = letterbox.target_shape.dims();
    if h == 0 || w == 0 {
        return Err(TogError::invalid_configuration(format!(
            "Target shape must be positive, got {}x{}",
            h, w
        )));
    }

    if letterbox.stride == 0 {
        return Err(TogError::invalid_configuration("Stride must be positive"));
    }

    Ok(())
}

/// Validate a convergence threshold.
pub fn validate_threshold(name: &str, threshold: f32) -> Result<()> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(TogError::invalid_configuration(format!(
            "{} threshold must be a non-negative number, got {}",
            name, threshold
        )));
    }

    Ok(())
}

/// Validate the iteration ceiling used by "min" budgets.
pub fn validate_iteration_ceiling(iterations: usize) -> Result<()> {
    if iterations == 0 {
        return Err(TogError::invalid_configuration(
            "Iteration ceiling must be positive",
        ));
    }

    if iterations > 1_000_000 {
        return Err(TogError::invalid_configuration(format!(
            "Iteration ceiling too large: {}",
            iterations
        )));
    }

    Ok(())
}

/// Validate the step size of an update rule.
pub fn validate_update_rule(rule: UpdateRule) -> Result<()> {
    let step = rule.magnitude();
    if !step.is_finite() || step <= 0.0 {
        return Err(TogError::invalid_configuration(format!(
            "Step size must be positive, got {}",
            step
        )));
    }

    if let UpdateRule::Sign { epsilon } = rule {
        if epsilon > 1.0 {
            return Err(TogError::invalid_configuration(format!(
                "Sign step larger than the pixel range: {}",
                epsilon
            )));
        }
    }

    Ok(())
}

/// Validate a loss value reported by the oracle.
pub fn validate_loss(loss: f32, iteration: usize) -> Result<()> {
    if !loss.is_finite() {
        return Err(TogError::numerical_instability(format!(
            "Loss is {} at iteration {}",
            loss, iteration
        )));
    }

    Ok(())
}
