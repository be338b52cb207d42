//! Color-dodge (divisive) blend producing the final sketch.
//!
//! `result = round(gray / inverted * 256)`, saturated to `0..=255`, where
//! `inverted = 255 - blur(gray)`. In flat regions `inverted` is roughly
//! `255 - gray`, so anything at mid-gray or lighter saturates to white
//! and darker areas keep a graphite tone. A zero divisor yields white.

use image::{GrayImage, Rgb};

use crate::sample::saturate;
use crate::types::RgbImage;

/// Scale applied to the quotient.
pub const DODGE_SCALE: f32 = 256.0;

/// Dodge a single gray sample against its inverted-blur counterpart.
#[inline]
#[must_use]
pub fn dodge_sample(gray: u8, inverted: u8) -> u8 {
    if inverted == 0 {
        return u8::MAX;
    }
    saturate(f32::from(gray) / f32::from(inverted) * DODGE_SCALE)
}

/// Color-dodge `gray` by `inverted`, pixel by pixel.
///
/// Both layers come from the same source image. Pixels are paired in
/// buffer order; any `gray` pixel without a partner is left as is.
#[must_use = "returns the single-channel sketch"]
pub(crate) fn color_dodge(gray: &GrayImage, inverted: &GrayImage) -> GrayImage {
    let mut sketch = gray.clone();
    for (sample, &divisor) in sketch.iter_mut().zip(inverted.iter()) {
        *sample = dodge_sample(*sample, divisor);
    }
    sketch
}

/// Replicate a single channel into three identical RGB channels.
#[must_use = "returns the RGB image"]
pub fn replicate_to_rgb(gray: &GrayImage) -> RgbImage {
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    })
}
