//! Core types for TOG adversarial attacks on object detectors.
//!
//! * [`image`] - immutable three channel images and their sources
//! * [`geometry`] - invertible letterbox transform
//! * [`target`] - vanishing and fabrication targets
//! * [`oracle`] - the differentiable detector contract

pub mod error;
pub mod geometry;
pub mod image;
pub mod oracle;
pub mod target;

pub use error::{OracleError, Result, TogError};
pub use geometry::{GeometryState, Letterbox, Padding, TargetShape};
pub use crate::image::{ColorOrder, Image, ImageSource};
pub use oracle::Oracle;
pub use target::{build_target, AttackType, BoundingBox, BoxSpec, LabeledBox, Target};
