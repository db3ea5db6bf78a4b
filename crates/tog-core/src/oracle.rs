//! Differentiable detection oracle.
//!
//! The attack never looks inside the detector. It only needs a forward pass
//! that tracks gradients, a scalar loss against a [`Target`], and the class
//! names the detector knows.

use burn::tensor::backend::AutodiffBackend;
use burn::tensor::Tensor;

use crate::error::OracleError;
use crate::target::Target;

/// Detection model plus loss, differentiable with respect to its input.
///
/// # Type Parameters
/// * `B` - Autodiff backend the input tensor lives on
///
/// Implementations must be deterministic for identical weights and input,
/// and must keep the loss attached to the input's autodiff graph so that
/// `loss.backward()` yields a gradient for it.
pub trait Oracle<B: AutodiffBackend> {
    /// Raw detector output handed from `forward` to `loss`.
    type Output;

    /// Run the detector on a `[1, 3, H, W]` tensor in `[0, 1]`.
    fn forward(&self, input: Tensor<B, 4>) -> Result<Self::Output, OracleError>;

    /// Scalar loss of `output` against `target`, shape `[1]`.
    fn loss(&self, output: Self::Output, target: &Target) -> Result<Tensor<B, 1>, OracleError>;

    /// Class index to name mapping.
    fn class_names(&self) -> &[String];

    /// Number of classes the detector knows.
    fn class_count(&self) -> usize {
        self.class_names().len()
    }

    /// Name used in logs.
    fn name(&self) -> &str {
        "oracle"
    }
}
