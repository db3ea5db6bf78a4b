//! Attack targets.
//!
//! A [`Target`] is the ground truth the detector is pushed towards: nothing
//! at all for a vanishing attack, or a set of labeled boxes for a fabrication
//! attack. Targets are built once per invocation with [`build_target`].

pub mod bbox;
pub mod box_spec;
pub mod build;

pub use bbox::{BoundingBox, LabeledBox};
pub use build::{build_target, AttackType, Target, MAX_RANDOM_BOXES};
pub use box_spec::BoxSpec;
