//! Letterbox resize and pad.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use super::adapter::{image_to_tensor, tensor_to_image};
use super::state::{GeometryState, Padding};
use crate::error::{Result, TogError};
use crate::image::Image;

/// Target tensor shape: a single side for squares or `(height, width)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetShape {
    Square(usize),
    Rect(usize, usize),
}

impl TargetShape {
    /// `(height, width)`.
    pub fn dims(self) -> (usize, usize) {
        match self {
            Self::Square(side) => (side, side),
            Self::Rect(h, w) => (h, w),
        }
    }
}

impl From<usize> for TargetShape {
    fn from(side: usize) -> Self {
        Self::Square(side)
    }
}

impl From<(usize, usize)> for TargetShape {
    fn from((h, w): (usize, usize)) -> Self {
        Self::Rect(h, w)
    }
}

/// Aspect-preserving resize with symmetric padding.
///
/// The default matches what the attack service feeds its detectors: a
/// `608x928` target, gray (114) padding, stride-32 alignment, upscaling
/// allowed.
///
/// # Examples
/// ```rust
/// use tog_core::geometry::Letterbox;
///
/// let letterbox = Letterbox::new((128, 128)).with_stride(32);
/// let state = letterbox.plan((100, 150));
/// assert_eq!(state.padded(), (96, 128));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Letterbox {
    /// Shape the image is fitted into.
    pub target_shape: TargetShape,
    /// RGB fill for the border.
    pub pad_color: [u8; 3],
    /// Pad only up to the next multiple of `stride` instead of the full
    /// target shape.
    pub align_to_stride: bool,
    /// Stretch to exactly the target shape. Ignored while
    /// `align_to_stride` is set.
    pub allow_stretch: bool,
    /// Allow scale factors above 1.
    pub allow_upscale: bool,
    /// Alignment stride.
    pub stride: usize,
}

impl Default for Letterbox {
    fn default() -> Self {
        Self {
            target_shape: TargetShape::Rect(608, 928),
            pad_color: [114, 114, 114],
            align_to_stride: true,
            allow_stretch: false,
            allow_upscale: true,
            stride: 32,
        }
    }
}

impl Letterbox {
    /// Create a letterbox for the given target shape with default options.
    pub fn new(target_shape: impl Into<TargetShape>) -> Self {
        Self {
            target_shape: target_shape.into(),
            ..Self::default()
        }
    }

    /// Set the border color.
    pub fn with_pad_color(mut self, rgb: [u8; 3]) -> Self {
        self.pad_color = rgb;
        self
    }

    /// Enable or disable stride alignment.
    pub fn with_stride_alignment(mut self, enabled: bool) -> Self {
        self.align_to_stride = enabled;
        self
    }

    /// Enable or disable stretching.
    pub fn with_stretch(mut self, enabled: bool) -> Self {
        self.allow_stretch = enabled;
        self
    }

    /// Enable or disable upscaling.
    pub fn with_upscale(mut self, enabled: bool) -> Self {
        self.allow_upscale = enabled;
        self
    }

    /// Set the alignment stride.
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    /// Derive scale and padding for an image of shape `original`.
    ///
    /// This is the single source of truth for both directions of the
    /// transform.
    pub fn plan(&self, original: (usize, usize)) -> GeometryState {
        let (h, w) = (original.0 as f64, original.1 as f64);
        let target = self.target_shape.dims();
        let (th, tw) = (target.0 as f64, target.1 as f64);

        let mut r = (th / h).min(tw / w);
        if !self.allow_upscale {
            r = r.min(1.0);
        }

        let mut ratio = (r, r);
        // extreme aspect ratios must not collapse an axis to zero
        let mut unpadded = (
            ((h * r).round_ties_even() as usize).max(1),
            ((w * r).round_ties_even() as usize).max(1),
        );
        let mut dh = th - unpadded.0 as f64;
        let mut dw = tw - unpadded.1 as f64;

        if self.align_to_stride {
            let stride = self.stride.max(1) as f64;
            dh = dh.rem_euclid(stride);
            dw = dw.rem_euclid(stride);
        } else if self.allow_stretch {
            dh = 0.0;
            dw = 0.0;
            unpadded = target;
            ratio = (th / h, tw / w);
        }

        GeometryState {
            original,
            ratio,
            unpadded,
            padding: Padding::split(dh, dw),
            target,
            stride: self.stride,
        }
    }

    /// Letterbox an image into a `[1, 3, H, W]` tensor.
    ///
    /// # Returns
    /// The tensor and the geometry used to build it.
    pub fn forward<B: Backend>(
        &self,
        image: &Image,
        device: &B::Device,
    ) -> (Tensor<B, 4>, GeometryState) {
        let state = self.plan(image.shape());

        let resized = if state.needs_resize() {
            imageops::resize(
                image.pixels(),
                state.unpadded.1 as u32,
                state.unpadded.0 as u32,
                FilterType::Triangle,
            )
        } else {
            image.pixels().clone()
        };

        let canvas = if state.padding.is_empty() {
            resized
        } else {
            let (ph, pw) = state.padded();
            let mut canvas = RgbImage::from_pixel(pw as u32, ph as u32, Rgb(self.pad_color));
            imageops::replace(
                &mut canvas,
                &resized,
                state.padding.left as i64,
                state.padding.top as i64,
            );
            canvas
        };

        (image_to_tensor::<B>(&canvas, device), state)
    }

    /// Map a letterboxed tensor back onto an image of shape `original`.
    ///
    /// Accepts `[3, H, W]` or `[1, 3, H, W]`. Padding is re-derived with
    /// [`Letterbox::plan`]; a tensor whose shape this letterbox could not have
    /// produced falls back to [`GeometryState::from_shapes`]. The result
    /// always has exactly the `original` dimensions and RGB order.
    pub fn inverse<B: Backend, const D: usize>(
        &self,
        tensor: Tensor<B, D>,
        original: (usize, usize),
    ) -> Result<Image> {
        if original.0 == 0 || original.1 == 0 {
            return Err(TogError::invalid_configuration(format!(
                "original shape {:?} has an empty axis",
                original
            )));
        }

        let padded = tensor_to_image(tensor)?;
        let shape = (padded.height() as usize, padded.width() as usize);

        let plan = self.plan(original);
        let state = if plan.padded() == shape {
            plan
        } else {
            tracing::debug!(
                "Tensor shape {:?} differs from planned {:?}, recovering geometry from shapes",
                shape,
                plan.padded()
            );
            GeometryState::from_shapes(original, shape)
        };

        let pad = state.padding;
        let crop_h = shape.0.saturating_sub(pad.vertical());
        let crop_w = shape.1.saturating_sub(pad.horizontal());
        if crop_h == 0 || crop_w == 0 {
            return Err(TogError::ShapeMismatch {
                expected: vec![state.padded().0, state.padded().1],
                actual: vec![shape.0, shape.1],
            });
        }

        let cropped = imageops::crop_imm(
            &padded,
            pad.left as u32,
            pad.top as u32,
            crop_w as u32,
            crop_h as u32,
        )
        .to_image();

        let pixels = if (crop_h, crop_w) != original {
            imageops::resize(
                &cropped,
                original.1 as u32,
                original.0 as u32,
                FilterType::Triangle,
            )
        } else {
            cropped
        };

        Ok(Image::from_rgb(pixels))
    }
}
