//! Gradient based pixel updates.

use burn::tensor::{backend::Backend, Tensor};

use crate::config::UpdateRule;

/// Scale each sample's gradient to unit L2 norm.
///
/// The norm runs over all non-batch dimensions and `epsilon` is added to it,
/// so an all-zero gradient stays zero.
pub fn l2_normalize<B: Backend>(gradient: Tensor<B, 4>, epsilon: f32) -> Tensor<B, 4> {
    let [n, c, h, w] = gradient.dims();
    let norm = gradient
        .clone()
        .reshape([n, c * h * w])
        .powf_scalar(2.0)
        .sum_dim(1)
        .sqrt()
        .add_scalar(epsilon)
        .reshape([n, 1, 1, 1]);
    gradient / norm
}

/// One descent step on `x`, clamped to the valid pixel range `[0, 1]`.
pub fn descend<B: Backend>(
    x: Tensor<B, 4>,
    gradient: Tensor<B, 4>,
    rule: UpdateRule,
    epsilon: f32,
) -> Tensor<B, 4> {
    let delta = match rule {
        UpdateRule::L2Normalized { step } => l2_normalize(gradient, epsilon).mul_scalar(step),
        UpdateRule::Sign { epsilon: step } => gradient.sign().mul_scalar(step),
    };
    (x - delta).clamp(0.0, 1.0)
}
