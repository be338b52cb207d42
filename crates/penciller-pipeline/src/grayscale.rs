//! Image decoding and grayscale conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP) and normalizes them to RGB,
//! then reduces tone-adjusted RGB to a single luma channel with the
//! BT.601 weights `0.299*R + 0.587*G + 0.114*B`.
//!
//! The weights are applied here rather than through
//! [`DynamicImage::to_luma8`], which uses BT.709 coefficients.

use image::{DynamicImage, GrayImage, Luma};

use crate::types::{PipelineError, RgbImage};

/// Red weight of the luma conversion, in thousandths.
pub const RED_WEIGHT: u32 = 299;
/// Green weight of the luma conversion, in thousandths.
pub const GREEN_WEIGHT: u32 = 587;
/// Blue weight of the luma conversion, in thousandths.
pub const BLUE_WEIGHT: u32 = 114;

/// Decode raw image bytes into a [`DynamicImage`].
///
/// Supports whatever formats the `image` crate was built with
/// (PNG, JPEG, BMP).
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty or the
/// decoded image has zero area.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let image = image::load_from_memory(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PipelineError::EmptyInput);
    }
    Ok(image)
}

/// Normalize any decoded image to 8-bit RGB.
///
/// Grayscale sources are replicated into three channels; alpha is
/// dropped.
#[must_use = "returns the RGB image"]
pub fn to_rgb(image: &DynamicImage) -> RgbImage {
    image.to_rgb8()
}

/// Luma of a single RGB sample, rounded half up.
///
/// Computed in integer thousandths so exact halves such as
/// `(2, 6, 170) -> 23.5` round consistently.
#[inline]
#[must_use]
pub fn luma(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb.map(u32::from);
    let weighted = RED_WEIGHT * r + GREEN_WEIGHT * g + BLUE_WEIGHT * b;
    // The weights sum to 1000, so the quotient never exceeds 255.
    u8::try_from((weighted + 500) / 1000).unwrap_or(u8::MAX)
}

/// Convert an RGB image to single-channel grayscale.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([luma(image.get_pixel(x, y).0)])
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Helper: encode a single 1x1 RGB pixel as a PNG byte buffer.
    fn encode_rgb_pixel(r: u8, g: u8, b: u8) -> Vec<u8> {
        let img = RgbImage::from_pixel(1, 1, image::Rgb([r, g, b]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        let result = decode(&[]);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn valid_png_decodes() {
        let png = encode_rgb_pixel(10, 20, 30);
        let rgb = to_rgb(&decode(&png).unwrap());
        assert_eq!(rgb.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn rgba_source_drops_alpha() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            2,
            2,
            image::Rgba([40, 50, 60, 7]),
        ));
        let rgb = to_rgb(&img);
        assert!(rgb.pixels().all(|p| p.0 == [40, 50, 60]));
    }

    #[test]
    fn gray_source_is_replicated() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([77])));
        let rgb = to_rgb(&img);
        assert_eq!(rgb.dimensions(), (3, 2));
        assert!(rgb.pixels().all(|p| p.0 == [77, 77, 77]));
    }

    #[test]
    fn white_is_255_and_black_is_0() {
        assert_eq!(luma([255, 255, 255]), 255);
        assert_eq!(luma([0, 0, 0]), 0);
    }

    #[test]
    fn neutral_gray_is_unchanged() {
        for v in [1, 64, 127, 128, 200, 254] {
            assert_eq!(luma([v, v, v]), v, "gray level {v}");
        }
    }

    #[test]
    fn bt601_weights() {
        // 0.299 * 255 = 76.245, 0.587 * 255 = 149.685, 0.114 * 255 = 29.07
        assert_eq!(luma([255, 0, 0]), 76);
        assert_eq!(luma([0, 255, 0]), 150);
        assert_eq!(luma([0, 0, 255]), 29);
    }

    #[test]
    fn exact_halves_round_up() {
        // 0.299*2 + 0.587*6 + 0.114*170 = 23.5
        assert_eq!(luma([2, 6, 170]), 24);
        // 0.299*0 + 0.587*0 + 0.114*25 = 2.85; 0.114*75 = 8.55
        assert_eq!(luma([0, 0, 25]), 3);
        assert_eq!(luma([0, 0, 75]), 9);
    }

    #[test]
    fn grayscale_conversion_orders_channels_by_weight() {
        let r_val = luma([255, 0, 0]);
        let g_val = luma([0, 255, 0]);
        let b_val = luma([0, 0, 255]);
        assert!(
            g_val > r_val && r_val > b_val,
            "expected green > red > blue luminance, got R={r_val} G={g_val} B={b_val}",
        );
    }

    #[test]
    fn output_dimensions_match_input() {
        let img = RgbImage::from_pixel(17, 31, image::Rgb([128, 64, 32]));
        let gray = to_grayscale(&img);
        assert_eq!(gray.width(), 17);
        assert_eq!(gray.height(), 31);
    }

    #[test]
    fn to_grayscale_applies_luma_per_pixel() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgb([255, 0, 0])
            } else {
                image::Rgb([0, 0, 255])
            }
        });
        let gray = to_grayscale(&img);
        assert_eq!(gray.get_pixel(0, 0).0[0], 76);
        assert_eq!(gray.get_pixel(1, 0).0[0], 29);
    }
}
