//! Differentiable grid detector used as a TOG oracle.
//!
//! * [`detector`] - single scale convolutional detector and its decoded output
//! * [`loss`] - objectness, box and class loss against an attack target
//! * [`oracle`] - the [`tog_core::Oracle`] implementation tying both together

pub mod detector;
pub mod loss;
pub mod oracle;

pub use detector::{Detection, Detections, GridDetector, GridDetectorConfig};
pub use loss::{DetectionLoss, LossGains};
pub use oracle::DetectorOracle;
