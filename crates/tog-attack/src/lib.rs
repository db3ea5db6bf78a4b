//! TOG adversarial perturbations against object detectors.
//!
//! [`Tog`] iteratively perturbs an image so that a differentiable detector
//! ([`tog_core::Oracle`]) either stops seeing objects (vanishing) or sees the
//! boxes it is told to (fabrication).
//!
//! ```rust,ignore
//! let engine = Tog::<B>::new(TogConfig::default(), device)?;
//! let request = AttackRequest::parse("vanishing", &json!("min"), &Value::Null)?;
//! let result = engine.attack(&oracle, ImageSource::path("street.jpg"), &request, &mut rng)?;
//! result.adversarial.pixels().save("adversarial.png")?;
//! ```

pub mod budget;
pub mod config;
pub mod engine;
pub mod gradient;
pub mod progress;
pub mod request;
pub mod validation;

pub use budget::IterationBudget;
pub use config::{TogConfig, UpdateRule};
pub use engine::{AttackResult, Termination, Tog};
pub use progress::{
    ConsoleProgressCallback, HistoryCallback, ProgressCallback, ProgressInfo, ProgressRun,
    ProgressTracker,
};
pub use request::AttackRequest;
pub use tog_core::{Result, TogError};
