use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        PaddingConfig2d, Relu,
    },
    tensor::{backend::Backend, Tensor},
};
use serde::{Deserialize, Serialize};

use super::output::Detections;

/// Channels per grid cell before the class scores: objectness and four box
/// coordinates.
pub const BOX_CHANNELS: usize = 5;

/// Single scale convolutional detector.
///
/// Every stage halves the resolution. The head predicts, per grid cell, one
/// objectness logit, four box logits in normalized `(x, y, w, h)` form and one
/// logit per class.
#[derive(Module, Debug)]
pub struct GridDetector<B: Backend> {
    stages: Vec<Conv2d<B>>,
    head: Conv2d<B>,
    activation: Relu,
    class_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDetectorConfig {
    /// Output channels of each stride-2 stage.
    pub channels: Vec<usize>,
    /// Number of classes the head predicts.
    pub class_count: usize,
}

impl Default for GridDetectorConfig {
    fn default() -> Self {
        Self {
            channels: vec![16, 32, 64],
            class_count: 80,
        }
    }
}

impl GridDetectorConfig {
    pub fn new(class_count: usize) -> Self {
        Self {
            class_count,
            ..Self::default()
        }
    }

    pub fn with_channels(mut self, channels: Vec<usize>) -> Self {
        self.channels = channels;
        self
    }

    /// Input pixels per grid cell.
    pub fn stride(&self) -> usize {
        1 << self.channels.len()
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> GridDetector<B> {
        let mut stages = Vec::with_capacity(self.channels.len());
        let mut in_channels = 3;
        for &out_channels in &self.channels {
            stages.push(
                Conv2dConfig::new([in_channels, out_channels], [3, 3])
                    .with_stride([2, 2])
                    .with_padding(PaddingConfig2d::Explicit(1, 1))
                    .init(device),
            );
            in_channels = out_channels;
        }

        let head =
            Conv2dConfig::new([in_channels, BOX_CHANNELS + self.class_count], [1, 1]).init(device);

        GridDetector {
            stages,
            head,
            activation: Relu::new(),
            class_count: self.class_count,
        }
    }
}

impl<B: Backend> GridDetector<B> {
    /// Run the detector on a `[N, 3, H, W]` batch.
    pub fn forward(&self, x: Tensor<B, 4>) -> Detections<B> {
        let input = x.dims();
        let mut x = x;
        for stage in &self.stages {
            x = self.activation.forward(stage.forward(x));
        }
        Detections::new(self.head.forward(x), [input[2], input[3]])
    }

    pub fn class_count(&self) -> usize {
        self.class_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_head_channels() {
        let device = Default::default();
        let model = GridDetectorConfig::new(3).with_channels(vec![4, 8]).init::<B>(&device);
        let out = model.forward(Tensor::zeros([1, 3, 32, 48], &device));
        assert_eq!(out.raw().dims(), [1, 8, 8, 12]);
        assert_eq!(model.class_count(), 3);
    }

    #[test]
    fn test_stride() {
        assert_eq!(GridDetectorConfig::default().stride(), 8);
        assert_eq!(GridDetectorConfig::new(1).with_channels(vec![4]).stride(), 2);
    }
}
