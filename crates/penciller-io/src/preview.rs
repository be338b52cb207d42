//! Preview thumbnails.
//!
//! Shrinks an image so it fits inside a square box while keeping its
//! aspect ratio. Images already inside the box are returned unchanged;
//! thumbnails never upscale.

use std::fmt;

use penciller_pipeline::RgbImage;

/// Side of the square box previews are fitted into by default.
pub const DEFAULT_PREVIEW_SIZE: u32 = 300;

/// Resampling filter used when shrinking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PreviewFilter {
    /// Nearest-neighbor: fastest, blocky artifacts.
    Nearest,
    /// Bilinear interpolation: fast, decent quality.
    #[default]
    Triangle,
    /// Bicubic (Catmull-Rom): good quality.
    CatmullRom,
    /// Lanczos with 3 lobes: sharpest.
    Lanczos3,
}

impl PreviewFilter {
    const fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Triangle => image::imageops::FilterType::Triangle,
            Self::CatmullRom => image::imageops::FilterType::CatmullRom,
            Self::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for PreviewFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("Nearest"),
            Self::Triangle => f.write_str("Triangle"),
            Self::CatmullRom => f.write_str("CatmullRom"),
            Self::Lanczos3 => f.write_str("Lanczos3"),
        }
    }
}

/// Dimensions of `(width, height)` scaled to fit inside a
/// `max_side` x `max_side` box. Never grows, never returns zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let long_axis = width.max(height);
    if long_axis <= max_side || long_axis == 0 {
        return (width, height);
    }
    let scale = f64::from(max_side) / f64::from(long_axis);
    let fit = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, max_side.max(1));
    (fit(width), fit(height))
}

/// Shrink `image` to fit inside a `max_side` box.
#[must_use = "returns the thumbnail"]
pub fn thumbnail(image: &RgbImage, max_side: u32, filter: PreviewFilter) -> RgbImage {
    let (w, h) = image.dimensions();
    let (tw, th) = fit_within(w, h, max_side);
    if (tw, th) == (w, h) {
        return image.clone();
    }
    image::imageops::resize(image, tw, th, filter.to_image_filter())
}
