//! Contrast and brightness adjustment.
//!
//! Both adjustments scale each sample directly: `s' = round(factor * s)`,
//! saturated into `0..=255`. Contrast is applied first, then brightness,
//! each rounding to 8 bits before the next runs.

use crate::sample::saturate;
use crate::types::RgbImage;

/// Factors are resolved to this many parts per unit before scaling.
const FACTOR_PARTS: u64 = 1_000_000;

/// Largest factor handled in fixed point; beyond it every nonzero sample
/// saturates anyway.
const MAX_FIXED_FACTOR: f64 = 1_000_000.0;

/// Scale a single sample by `factor`, rounding and saturating.
///
/// The factor is resolved to millionths and the product computed in
/// integers, so decimal factors such as `1.3` round exact halves up
/// (`45 * 1.3 = 58.5 -> 59`). Negative factors produce 0; NaN produces 0.
#[inline]
#[must_use]
pub fn scale_sample(sample: u8, factor: f32) -> u8 {
    let wide = f64::from(factor);
    if !(0.0..=MAX_FIXED_FACTOR).contains(&wide) {
        return saturate(factor * f32::from(sample));
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let parts = (wide * FACTOR_PARTS as f64).round() as u64;
    let scaled = (u64::from(sample) * parts + FACTOR_PARTS / 2) / FACTOR_PARTS;
    u8::try_from(scaled).unwrap_or(u8::MAX)
}

/// Apply contrast then brightness to every channel of every pixel.
///
/// Factors are used as given; the pipeline clamps them before calling
/// this. A factor of `1.0` leaves samples unchanged and `0.0` produces
/// black.
#[must_use = "returns the adjusted image"]
pub fn adjust_tone(image: &RgbImage, contrast: f32, brightness: f32) -> RgbImage {
    let mut adjusted = image.clone();
    for sample in adjusted.iter_mut() {
        *sample = scale_sample(scale_sample(*sample, contrast), brightness);
    }
    adjusted
}
