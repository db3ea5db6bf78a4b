//! Conversions between pixel grids and detector tensors.
//!
//! Detector tensors are RGB, channels-first, scaled to `[0, 1]`, with a
//! batch dimension of one: `[1, 3, H, W]`.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use image::RgbImage;

use crate::error::{Result, TogError};

/// Convert RGB pixels to a `[1, 3, H, W]` tensor in `[0, 1]`.
pub fn image_to_tensor<B: Backend>(pixels: &RgbImage, device: &B::Device) -> Tensor<B, 4> {
    let (width, height) = pixels.dimensions();
    let (width, height) = (width as usize, height as usize);
    let plane = width * height;

    let mut values = vec![0.0f32; 3 * plane];
    for (i, px) in pixels.pixels().enumerate() {
        for c in 0..3 {
            values[c * plane + i] = px.0[c] as f32 / 255.0;
        }
    }

    Tensor::<B, 4>::from_data(TensorData::new(values, [1, 3, height, width]), device)
}

/// Convert a `[3, H, W]` or `[1, 3, H, W]` tensor back to RGB pixels.
///
/// Values are scaled by 255, rounded and saturated into `0..=255`, so
/// negative entries (e.g. noise) map to black.
pub fn tensor_to_image<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<RgbImage> {
    let dims = tensor.dims();
    let (channels, height, width) = match dims.as_slice() {
        [c, h, w] => (*c, *h, *w),
        [1, c, h, w] => (*c, *h, *w),
        other => {
            return Err(TogError::ShapeMismatch {
                expected: vec![1, 3, 0, 0],
                actual: other.to_vec(),
            })
        }
    };
    if channels != 3 {
        return Err(TogError::ShapeMismatch {
            expected: vec![3, height, width],
            actual: dims.to_vec(),
        });
    }

    let values = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| TogError::numerical_instability(format!("{:?}", e)))?;

    let plane = height * width;
    let mut raw = Vec::with_capacity(3 * plane);
    for i in 0..plane {
        for c in 0..3 {
            raw.push(denormalize(values[c * plane + i]));
        }
    }

    RgbImage::from_raw(width as u32, height as u32, raw).ok_or_else(|| TogError::ShapeMismatch {
        expected: vec![3, height, width],
        actual: dims.to_vec(),
    })
}

fn denormalize(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
