//! Vanishing and fabrication attacks on a synthetic scene.
//!
//! Run with `RUST_LOG=info cargo run -p tog-attack --example vanishing_attack`.

use std::sync::Arc;

use anyhow::Result;
use burn::backend::Autodiff;
use burn::tensor::backend::Backend;
use burn_ndarray::NdArray;
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tog_attack::{
    AttackRequest, ConsoleProgressCallback, IterationBudget, ProgressTracker, Tog, TogConfig,
};
use tog_core::{Image, ImageSource, Letterbox};
use tog_model::{Detection, DetectorOracle, GridDetectorConfig};

type B = Autodiff<NdArray<f32>>;

fn scene() -> RgbImage {
    RgbImage::from_fn(200, 150, |x, y| {
        let in_box = (60..140).contains(&x) && (40..110).contains(&y);
        if in_box {
            Rgb([220, 40, 40])
        } else {
            Rgb([90, 110 + (y / 3) as u8, 140])
        }
    })
}

fn detect(
    oracle: &DetectorOracle<B>,
    letterbox: &Letterbox,
    image: &Image,
) -> Result<Vec<Detection>> {
    let (tensor, _) = letterbox.forward::<B>(image, &Default::default());
    Ok(oracle.detect(tensor).decode(0.5)?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    B::seed(42);
    let device = Default::default();
    let names = ["person", "bicycle", "car", "dog"].map(String::from).to_vec();
    let oracle = DetectorOracle::<B>::init(&GridDetectorConfig::default(), names, &device);

    let letterbox = Letterbox::new((128, 160));
    let config = TogConfig::default()
        .with_letterbox(letterbox.clone())
        .with_max_iterations(200);
    let progress = ProgressTracker::new().with_callback(Arc::new(ConsoleProgressCallback::new(25)));
    let engine = Tog::<B>::new(config, device)?.with_progress(progress);

    let original = Image::load(ImageSource::from(scene()))?;
    let mut rng = StdRng::seed_from_u64(0);
    let out_dir = std::env::temp_dir();

    let vanishing = AttackRequest::vanishing(IterationBudget::UntilConverged);
    let result = engine.attack(&oracle, ImageSource::from(scene()), &vanishing, &mut rng)?;
    println!(
        "vanishing: {:?}, final loss {:?}, detections {} -> {}",
        result.termination,
        result.final_loss(),
        detect(&oracle, &letterbox, &original)?.len(),
        detect(&oracle, &letterbox, &result.adversarial)?.len()
    );
    result.adversarial.pixels().save(out_dir.join("tog_vanishing.png"))?;
    result.noise.pixels().save(out_dir.join("tog_vanishing_noise.png"))?;

    let fabrication = AttackRequest::parse(
        "fabrication",
        &json!(50),
        &json!([[2, 0.25, 0.3, 0.2, 0.2]]),
    )?;
    let result = engine.attack(&oracle, ImageSource::from(scene()), &fabrication, &mut rng)?;
    let detections = detect(&oracle, &letterbox, &result.adversarial)?;
    println!(
        "fabrication: {:?}, final loss {:?}, detections after: {:?}",
        result.termination,
        result.final_loss(),
        oracle.labels(&detections)
    );
    result.adversarial.pixels().save(out_dir.join("tog_fabrication.png"))?;

    println!("images written to {}", out_dir.display());
    Ok(())
}
