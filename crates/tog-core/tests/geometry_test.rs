use burn::tensor::Tensor;
use burn_ndarray::NdArray;
use image::{Rgb, RgbImage};
use proptest::prelude::*;
use tog_core::geometry::{image_to_tensor, Letterbox};
use tog_core::image::{ColorOrder, Image};

type B = NdArray<f32>;

fn gradient_image(height: usize, width: usize) -> Image {
    Image::from_rgb(RgbImage::from_fn(width as u32, height as u32, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

#[test]
fn test_gray_image_aligned_scenario() {
    let device = Default::default();
    let image = Image::filled(100, 150, [128, 128, 128]);
    let letterbox = Letterbox::new((128, 128))
        .with_stride(32)
        .with_stride_alignment(true)
        .with_upscale(true);

    let (tensor, state) = letterbox.forward::<B>(&image, &device);
    // 43 rows of slack reduced modulo the stride
    assert_eq!(tensor.dims(), [1, 3, 96, 128]);
    assert_eq!(state.original, (100, 150));

    let restored = letterbox.inverse(tensor, state.original).unwrap();
    assert_eq!(restored.shape(), (100, 150));
    assert_eq!(restored.to_raw().len(), 100 * 150 * 3);
}

#[test]
fn test_gray_image_full_padding_scenario() {
    let device = Default::default();
    let image = Image::filled(100, 150, [128, 128, 128]);
    let letterbox = Letterbox::new((128, 128)).with_stride_alignment(false);

    let (tensor, state) = letterbox.forward::<B>(&image, &device);
    assert_eq!(tensor.dims(), [1, 3, 128, 128]);
    assert_eq!(state.original, (100, 150));

    let restored = letterbox.inverse(tensor, (100, 150)).unwrap();
    assert_eq!(restored.shape(), (100, 150));
}

#[test]
fn test_padding_uses_fill_color() {
    let device = Default::default();
    let image = Image::filled(100, 150, [200, 10, 10]);
    let letterbox = Letterbox::new((128, 128)).with_stride_alignment(false);

    let (tensor, state) = letterbox.forward::<B>(&image, &device);
    assert_eq!(state.padding.top, 21);

    let data = tensor.into_data();
    let values = data.as_slice::<f32>().unwrap();
    let fill = 114.0 / 255.0;
    // first row is border, all channels
    assert!((values[0] - fill).abs() < 1e-6);
    assert!((values[128 * 128] - fill).abs() < 1e-6);
    // center row is image content
    let center = 64 * 128 + 64;
    assert!((values[center] - 200.0 / 255.0).abs() < 1e-2);
}

#[test]
fn test_uniform_image_roundtrip_preserves_pixels() {
    let device = Default::default();
    let image = Image::filled(60, 90, [128, 64, 32]);
    let letterbox = Letterbox::new(64);

    let (tensor, state) = letterbox.forward::<B>(&image, &device);
    let restored = letterbox.inverse(tensor, state.original).unwrap();

    for px in restored.pixels().pixels() {
        for (got, want) in px.0.iter().zip([128u8, 64, 32]) {
            assert!((*got as i32 - want as i32).abs() <= 1, "{:?}", px);
        }
    }
}

#[test]
fn test_same_size_is_lossless() {
    let device = Default::default();
    let image = gradient_image(64, 96);
    let letterbox = Letterbox::new((64, 96));

    let (tensor, state) = letterbox.forward::<B>(&image, &device);
    assert!(!state.needs_resize());
    assert!(state.padding.is_empty());

    let restored = letterbox.inverse(tensor, state.original).unwrap();
    assert_eq!(restored.pixels(), image.pixels());
}

#[test]
fn test_stretch_roundtrip() {
    let device = Default::default();
    let image = gradient_image(50, 200);
    let letterbox = Letterbox::new((64, 64))
        .with_stride_alignment(false)
        .with_stretch(true);

    let (tensor, state) = letterbox.forward::<B>(&image, &device);
    assert_eq!(tensor.dims(), [1, 3, 64, 64]);
    assert!(state.padding.is_empty());

    let restored = letterbox.inverse(tensor, state.original).unwrap();
    assert_eq!(restored.shape(), (50, 200));
}

#[test]
fn test_inverse_of_foreign_tensor_shape() {
    let device = Default::default();
    let letterbox = Letterbox::new((128, 128));
    let tensor = Tensor::<B, 4>::zeros([1, 3, 40, 70], &device);

    let restored = letterbox.inverse(tensor, (100, 150)).unwrap();
    assert_eq!(restored.shape(), (100, 150));
}

#[test]
fn test_inverse_strips_batch_dimension() {
    let device = Default::default();
    let letterbox = Letterbox::new((32, 32));
    let chw = Tensor::<B, 3>::ones([3, 32, 32], &device);

    let restored = letterbox.inverse(chw, (32, 32)).unwrap();
    assert_eq!(restored.rgb_at(0, 0), [255, 255, 255]);
    assert_eq!(restored.order(), ColorOrder::Rgb);
}

#[test]
fn test_adapter_matches_forward_without_geometry() {
    let device = Default::default();
    let image = gradient_image(32, 32);
    let (tensor, _) = Letterbox::new(32).forward::<B>(&image, &device);
    let direct = image_to_tensor::<B>(image.pixels(), &device);

    let diff = (tensor - direct).abs().max().into_scalar();
    assert!(diff < 1e-6);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_roundtrip_dimensions(
        height in 1usize..160,
        width in 1usize..160,
        target_h in 8usize..160,
        target_w in 8usize..160,
        stride in 1usize..64,
        align in any::<bool>(),
        stretch in any::<bool>(),
        upscale in any::<bool>(),
    ) {
        let device = Default::default();
        let image = gradient_image(height, width);
        let letterbox = Letterbox::new((target_h, target_w))
            .with_stride(stride)
            .with_stride_alignment(align)
            .with_stretch(stretch)
            .with_upscale(upscale);

        let (tensor, state) = letterbox.forward::<B>(&image, &device);
        let [batch, channels, h, w] = tensor.dims();
        prop_assert_eq!((batch, channels), (1, 3));
        prop_assert_eq!((h, w), state.padded());
        prop_assert!(h <= target_h.max(height) && w <= target_w.max(width));

        let restored = letterbox.inverse(tensor, state.original).unwrap();
        prop_assert_eq!(restored.shape(), (height, width));
    }
}
