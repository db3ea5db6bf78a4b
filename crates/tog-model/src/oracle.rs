//! [`Oracle`] implementation over a [`GridDetector`].

use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::Tensor;
use tog_core::{Oracle, OracleError, Target};

use crate::detector::{Detection, Detections, GridDetector, GridDetectorConfig};
use crate::loss::DetectionLoss;

/// Grid detector plus detection loss with named classes.
#[derive(Debug)]
pub struct DetectorOracle<B: Backend> {
    model: GridDetector<B>,
    loss: DetectionLoss,
    class_names: Vec<String>,
}

impl<B: Backend> DetectorOracle<B> {
    /// Wrap an existing model.
    ///
    /// # Errors
    /// `InvalidTarget` if the number of names differs from the classes the
    /// model predicts.
    pub fn new(
        model: GridDetector<B>,
        loss: DetectionLoss,
        class_names: Vec<String>,
    ) -> Result<Self, OracleError> {
        if model.class_count() != class_names.len() {
            return Err(OracleError::invalid_target(format!(
                "{} class names for a detector with {} classes",
                class_names.len(),
                model.class_count()
            )));
        }
        Ok(Self {
            model,
            loss,
            class_names,
        })
    }

    /// Freshly initialized detector for the given class names.
    pub fn init(config: &GridDetectorConfig, class_names: Vec<String>, device: &B::Device) -> Self {
        let config = GridDetectorConfig {
            class_count: class_names.len(),
            ..config.clone()
        };
        Self {
            model: config.init(device),
            loss: DetectionLoss::default(),
            class_names,
        }
    }

    pub fn model(&self) -> &GridDetector<B> {
        &self.model
    }

    /// Labels of `detections` against this oracle's class names.
    ///
    /// Detections whose class has no name are skipped.
    pub fn labels(&self, detections: &[Detection]) -> Vec<String> {
        detections
            .iter()
            .filter_map(|detection| detection.label(&self.class_names))
            .collect()
    }

    /// Run the model without checking the input shape.
    pub fn detect(&self, input: Tensor<B, 4>) -> Detections<B> {
        self.model.forward(input)
    }
}

impl<B: AutodiffBackend> Oracle<B> for DetectorOracle<B> {
    type Output = Detections<B>;

    fn forward(&self, input: Tensor<B, 4>) -> Result<Self::Output, OracleError> {
        let [batch, channels, h, w] = input.dims();
        if batch != 1 || channels != 3 || h == 0 || w == 0 {
            return Err(OracleError::ShapeMismatch {
                expected: vec![1, 3, h.max(1), w.max(1)],
                actual: vec![batch, channels, h, w],
            });
        }
        Ok(self.model.forward(input))
    }

    fn loss(&self, output: Self::Output, target: &Target) -> Result<Tensor<B, 1>, OracleError> {
        self.loss.forward(&output, target)
    }

    fn class_names(&self) -> &[String] {
        &self.class_names
    }

    fn name(&self) -> &str {
        "grid-detector"
    }
}
