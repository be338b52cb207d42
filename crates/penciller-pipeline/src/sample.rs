//! Conversion of floating-point intermediates back to 8-bit samples.
//!
//! Every stage that computes in `f32` funnels its result through
//! [`saturate`], so no stage can leak values outside `0..=255`.

use imageproc::definitions::Clamp;

/// Round to the nearest integer (half away from zero) and clamp into
/// `0..=255`.
///
/// NaN maps to 0.
#[inline]
#[must_use]
pub fn saturate(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    <u8 as Clamp<f32>>::clamp(value.round())
}
