//! Error types for adversarial attack operations.
//!
//! This module provides the error taxonomy shared by image loading, target
//! construction, the perturbation engine and the detection oracle.

use thiserror::Error;

/// Errors raised by a detection oracle.
///
/// The engine never wraps or rewrites these; they surface to the caller
/// through [`TogError::OracleFailure`] with their original message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    /// Detection output and target (or input) shapes disagree.
    #[error("Oracle shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// The target cannot be expressed against this detector's output.
    #[error("Oracle rejected target: {0}")]
    InvalidTarget(String),

    /// The loss does not depend on the input tensor, so no gradient exists.
    #[error("Loss is detached from the input tensor")]
    DetachedInput,

    /// Any other failure inside the detection runtime.
    #[error("Oracle backend error: {0}")]
    Backend(String),
}

impl OracleError {
    /// Create an invalid target error.
    pub fn invalid_target(msg: impl Into<String>) -> Self {
        Self::InvalidTarget(msg.into())
    }

    /// Create a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Main error type for attack operations.
#[derive(Error, Debug)]
pub enum TogError {
    /// The image source could not be turned into a three channel pixel grid.
    #[error("Invalid image source: {0}")]
    InvalidImageSource(String),

    /// The fabrication box specification is malformed.
    #[error("Invalid attack specification: {0}")]
    InvalidAttackSpec(String),

    /// The iteration budget is neither a non-negative integer nor "min".
    #[error("Invalid iteration specification: {0}")]
    InvalidIterationSpec(String),

    /// Failure reported by the detection oracle, passed through unchanged.
    #[error(transparent)]
    OracleFailure(#[from] OracleError),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Shape mismatch.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Numerical instability detected.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

/// Result type for attack operations.
pub type Result<T> = std::result::Result<T, TogError>;

impl TogError {
    /// Create an invalid image source error.
    pub fn image_source(msg: impl Into<String>) -> Self {
        Self::InvalidImageSource(msg.into())
    }

    /// Create an invalid attack specification error.
    pub fn attack_spec(msg: impl Into<String>) -> Self {
        Self::InvalidAttackSpec(msg.into())
    }

    /// Create an invalid iteration specification error.
    pub fn iteration_spec(msg: impl Into<String>) -> Self {
        Self::InvalidIterationSpec(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a numerical instability error.
    pub fn numerical_instability(msg: impl Into<String>) -> Self {
        Self::NumericalInstability(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = TogError::attack_spec("bad rows");
        assert!(matches!(err, TogError::InvalidAttackSpec(_)));
    }

    #[test]
    fn test_error_display() {
        let err = TogError::iteration_spec("max");
        assert_eq!(err.to_string(), "Invalid iteration specification: max");
    }

    #[test]
    fn test_oracle_error_is_transparent() {
        let inner = OracleError::ShapeMismatch {
            expected: vec![1, 7, 4, 4],
            actual: vec![1, 6, 4, 4],
        };
        let message = inner.to_string();
        let err: TogError = inner.clone().into();
        assert_eq!(err.to_string(), message);
        assert!(matches!(err, TogError::OracleFailure(e) if e == inner));
    }
}
