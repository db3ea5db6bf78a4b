//! Image types and loading.
//!
//! This module provides the immutable three channel [`Image`] the attack
//! operates on and the [`ImageSource`] forms it can be loaded from.

pub mod image;
pub mod source;

pub use self::image::Image;
pub use source::{ColorOrder, ImageSource};
