//! Letterbox geometry.
//!
//! Maps an arbitrary image onto the fixed, stride-aligned tensor a detector
//! expects and back onto the original pixel grid. Forward and inverse derive
//! scale and padding from the same [`Letterbox::plan`], which is what keeps
//! the round trip exact in its output dimensions.

pub mod adapter;
pub mod letterbox;
pub mod state;

pub use adapter::{image_to_tensor, tensor_to_image};
pub use letterbox::{Letterbox, TargetShape};
pub use state::{GeometryState, Padding};
