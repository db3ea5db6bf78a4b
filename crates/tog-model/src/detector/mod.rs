pub mod network;
pub mod output;

pub use network::{GridDetector, GridDetectorConfig};
pub use output::{Detection, Detections};
