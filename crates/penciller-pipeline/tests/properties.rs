//! Property tests over the public pipeline API.

#![allow(clippy::unwrap_used)]

use penciller_pipeline::blur::{BlurKernel, gaussian_blur};
use penciller_pipeline::dodge::dodge_sample;
use penciller_pipeline::pipeline::{Advance, Stage};
use penciller_pipeline::tone::adjust_tone;
use penciller_pipeline::{DynamicImage, GrayImage, Pipeline, RgbImage, SketchParameters, convert};
use proptest::prelude::*;

/// Small RGB images with arbitrary pixel data.
fn rgb_image_strategy() -> impl Strategy<Value = RgbImage> {
    (1u32..=12, 1u32..=12).prop_flat_map(|(w, h)| {
        prop::collection::vec(any::<u8>(), (w * h * 3) as usize)
            .prop_map(move |raw| RgbImage::from_raw(w, h, raw).unwrap())
    })
}

/// Parameters including values well outside the accepted ranges.
fn parameters_strategy() -> impl Strategy<Value = SketchParameters> {
    (-5.0f32..30.0, -1.0f32..4.0, -1.0f32..4.0)
        .prop_map(|(t, c, b)| SketchParameters::new(t, c, b))
}

proptest! {
    /// Property: the sketch has the input's dimensions and three equal channels.
    #[test]
    fn prop_sketch_shape(img in rgb_image_strategy(), params in parameters_strategy()) {
        let dims = img.dimensions();
        let sketch = convert(&DynamicImage::ImageRgb8(img), &params).unwrap();
        prop_assert_eq!(sketch.dimensions(), dims);
        for p in sketch.pixels() {
            prop_assert!(p.0[0] == p.0[1] && p.0[1] == p.0[2]);
        }
    }

    /// Property: unit contrast and brightness leave the image unchanged.
    #[test]
    fn prop_identity_tone(img in rgb_image_strategy()) {
        prop_assert_eq!(adjust_tone(&img, 1.0, 1.0), img);
    }

    /// Property: blurring a uniform image returns the same image.
    #[test]
    fn prop_uniform_blur_is_stable(
        (w, h) in (1u32..=16, 1u32..=16),
        value in any::<u8>(),
        size in 3u32..=21,
    ) {
        let img = GrayImage::from_pixel(w, h, image::Luma([value]));
        prop_assert_eq!(gaussian_blur(&img, BlurKernel::from_size(size)), img);
    }

    /// Property: the kernel is always odd and within `3..=21`.
    #[test]
    fn prop_kernel_size_bounds(params in parameters_strategy()) {
        let size = params.clamped().kernel_size();
        prop_assert!(size % 2 == 1);
        prop_assert!((3..=21).contains(&size));
    }

    /// Property: dodge is monotone in the gray value for a fixed divisor.
    #[test]
    fn prop_dodge_monotone(a in any::<u8>(), b in any::<u8>(), inverted in 1u8..=255) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(dodge_sample(lo, inverted) <= dodge_sample(hi, inverted));
    }

    /// Property: the stage loop and the typed chain agree.
    #[test]
    fn prop_dynamic_matches_typed(img in rgb_image_strategy(), params in parameters_strategy()) {
        let typed = Pipeline::from_rgb(img.clone(), params)
            .unwrap()
            .adjust_tone()
            .grayscale()
            .blur_and_invert()
            .dodge()
            .into_sketch();

        let mut stage: Stage = Pipeline::from_rgb(img, params).unwrap().into();
        loop {
            match stage.advance().unwrap() {
                Advance::Next(next) => stage = next,
                Advance::Complete(done) => {
                    stage = done;
                    break;
                }
            }
        }
        prop_assert_eq!(stage.complete().unwrap().sketch, typed);
    }
}
