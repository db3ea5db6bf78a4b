use burn::backend::Autodiff;
use burn::tensor::{Distribution, Tensor};
use burn_ndarray::NdArray;
use tog_core::{BoundingBox, LabeledBox, Oracle, OracleError, Target};
use tog_model::{Detection, DetectionLoss, DetectorOracle, GridDetectorConfig};

type B = Autodiff<NdArray<f32>>;

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("class{}", i)).collect()
}

fn oracle(device: &<B as burn::tensor::backend::Backend>::Device) -> DetectorOracle<B> {
    let config = GridDetectorConfig::default().with_channels(vec![4, 8]);
    DetectorOracle::init(&config, names(3), device)
}

#[test]
fn test_loss_gradient_reaches_input() {
    let device = Default::default();
    let oracle = oracle(&device);

    let x = Tensor::<B, 4>::random([1, 3, 32, 32], Distribution::Uniform(0.0, 1.0), &device)
        .require_grad();
    let out = oracle.forward(x.clone()).unwrap();
    let loss = oracle.loss(out, &Target::Vanishing).unwrap();
    assert_eq!(loss.dims(), [1]);

    let grads = loss.backward();
    let grad = x.grad(&grads).expect("input gradient");
    assert_eq!(grad.dims(), [1, 3, 32, 32]);

    let magnitude = grad.abs().sum().into_scalar();
    assert!(magnitude > 0.0);
}

#[test]
fn test_loss_is_deterministic() {
    let device = Default::default();
    let oracle = oracle(&device);
    let x = Tensor::<B, 4>::ones([1, 3, 16, 24], &device) * 0.5;
    let target = Target::Fabrication(vec![LabeledBox::new(
        2,
        BoundingBox::new(0.5, 0.5, 0.3, 0.3),
    )]);

    let a = oracle.loss(oracle.forward(x.clone()).unwrap(), &target).unwrap().into_scalar();
    let b = oracle.loss(oracle.forward(x).unwrap(), &target).unwrap().into_scalar();
    assert_eq!(a, b);
    assert!(a.is_finite());
}

#[test]
fn test_fabrication_adds_box_and_class_terms() {
    let device = Default::default();
    let oracle = oracle(&device);
    let x = Tensor::<B, 4>::zeros([1, 3, 16, 16], &device);
    let target = Target::Fabrication(vec![LabeledBox::new(
        0,
        BoundingBox::new(0.3, 0.6, 0.2, 0.4),
    )]);

    let vanishing = oracle.loss(oracle.forward(x.clone()).unwrap(), &Target::Vanishing).unwrap();
    let fabrication = oracle.loss(oracle.forward(x).unwrap(), &target).unwrap();
    assert_ne!(vanishing.into_scalar(), fabrication.into_scalar());
}

#[test]
fn test_forward_rejects_batches() {
    let device = Default::default();
    let oracle = oracle(&device);
    let err = oracle.forward(Tensor::zeros([2, 3, 16, 16], &device)).unwrap_err();
    assert!(matches!(err, OracleError::ShapeMismatch { .. }));
}

#[test]
fn test_class_names() {
    let device = Default::default();
    let oracle = oracle(&device);
    assert_eq!(oracle.class_count(), 3);
    assert_eq!(oracle.class_names()[2], "class2");
    assert_eq!(oracle.name(), "grid-detector");
}

#[test]
fn test_labels_use_class_names() {
    let device = Default::default();
    let oracle = oracle(&device);
    let detections = [
        Detection {
            class: 2,
            score: 0.5,
            bbox: BoundingBox::new(0.5, 0.5, 0.1, 0.1),
        },
        Detection {
            class: 7,
            score: 0.9,
            bbox: BoundingBox::new(0.2, 0.2, 0.1, 0.1),
        },
    ];
    assert_eq!(oracle.labels(&detections), vec!["class2 (50%)".to_string()]);
}

#[test]
fn test_name_count_must_match_model() {
    let device = Default::default();
    let model = GridDetectorConfig::new(4).with_channels(vec![4]).init::<B>(&device);
    let err = DetectorOracle::new(model, DetectionLoss::default(), names(3)).unwrap_err();
    assert!(matches!(err, OracleError::InvalidTarget(_)));
}
