//! Shared types for the penciller sketch pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference
/// single-channel intermediates without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference the
/// pipeline's input and output without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `DynamicImage` for callers that hand the pipeline an
/// already-decoded image of arbitrary color type.
pub use image::DynamicImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of any image buffer.
    #[must_use]
    pub fn of<P: image::Pixel>(image: &image::ImageBuffer<P, Vec<P::Subpixel>>) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `true` if either axis is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Parameters controlling a single sketch conversion.
///
/// Fields are public and unchecked so that shells can build a value
/// from whatever their controls produce. The pipeline never trusts them:
/// it works on [`clamped`](Self::clamped) values, pulling each field
/// into its documented range and replacing non-finite values with the
/// default. Use [`try_new`](Self::try_new) to reject out-of-range
/// values instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchParameters {
    /// Pencil line boldness, 1 (fine) to 10 (bold).
    ///
    /// Rounded and mapped to an odd Gaussian kernel size
    /// `2 * line_thickness + 1`, so 10 gives the classic 21x21 kernel.
    pub line_thickness: f32,

    /// Multiplicative contrast factor, 0.1 to 2.0. Applied to every
    /// sample before brightness.
    pub contrast: f32,

    /// Multiplicative brightness factor, 0.1 to 2.0.
    pub brightness: f32,
}

impl SketchParameters {
    /// Default line thickness (maps to a 21x21 kernel).
    pub const DEFAULT_LINE_THICKNESS: f32 = 10.0;

    /// Smallest accepted line thickness.
    pub const MIN_LINE_THICKNESS: f32 = 1.0;

    /// Largest accepted line thickness.
    pub const MAX_LINE_THICKNESS: f32 = 10.0;

    /// Default contrast factor (identity).
    pub const DEFAULT_CONTRAST: f32 = 1.0;

    /// Default brightness factor (identity).
    pub const DEFAULT_BRIGHTNESS: f32 = 1.0;

    /// Smallest accepted contrast or brightness factor.
    pub const MIN_FACTOR: f32 = 0.1;

    /// Largest accepted contrast or brightness factor.
    pub const MAX_FACTOR: f32 = 2.0;

    /// Create parameters without validation.
    #[must_use]
    pub const fn new(line_thickness: f32, contrast: f32, brightness: f32) -> Self {
        Self {
            line_thickness,
            contrast,
            brightness,
        }
    }

    /// Create parameters, rejecting any value outside its range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] naming the first
    /// field that is non-finite or outside its documented range.
    pub fn try_new(line_thickness: f32, contrast: f32, brightness: f32) -> Result<Self, PipelineError> {
        check_range(
            "line_thickness",
            line_thickness,
            Self::MIN_LINE_THICKNESS,
            Self::MAX_LINE_THICKNESS,
        )?;
        check_range("contrast", contrast, Self::MIN_FACTOR, Self::MAX_FACTOR)?;
        check_range("brightness", brightness, Self::MIN_FACTOR, Self::MAX_FACTOR)?;
        Ok(Self::new(line_thickness, contrast, brightness))
    }

    /// Copy of these parameters with every field pulled into range.
    ///
    /// Non-finite values (NaN, infinities) fall back to the default
    /// for that field.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            line_thickness: clamp_or(
                self.line_thickness,
                Self::MIN_LINE_THICKNESS,
                Self::MAX_LINE_THICKNESS,
                Self::DEFAULT_LINE_THICKNESS,
            ),
            contrast: clamp_or(
                self.contrast,
                Self::MIN_FACTOR,
                Self::MAX_FACTOR,
                Self::DEFAULT_CONTRAST,
            ),
            brightness: clamp_or(
                self.brightness,
                Self::MIN_FACTOR,
                Self::MAX_FACTOR,
                Self::DEFAULT_BRIGHTNESS,
            ),
        }
    }

    /// Odd Gaussian kernel size derived from the clamped line thickness.
    ///
    /// Always in `3..=21`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn kernel_size(self) -> u32 {
        let steps = self.clamped().line_thickness.round() as u32;
        2 * steps + 1
    }
}

impl Default for SketchParameters {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_LINE_THICKNESS,
            Self::DEFAULT_CONTRAST,
            Self::DEFAULT_BRIGHTNESS,
        )
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), PipelineError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(PipelineError::InvalidParameter {
            name,
            value,
            min,
            max,
        })
    }
}

/// Result of running the pipeline with all intermediate stage outputs preserved.
///
/// Each field captures the output of one stage so shells can show
/// previews of every step.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Stage 1: decoded source normalized to RGB.
    pub original: RgbImage,
    /// Stage 2: contrast- then brightness-adjusted RGB.
    pub toned: RgbImage,
    /// Stage 3: luma-weighted grayscale.
    pub grayscale: GrayImage,
    /// Stage 4a: Gaussian-blurred grayscale.
    pub blurred: GrayImage,
    /// Stage 4b: `255 - blurred`.
    pub inverted: GrayImage,
    /// Stage 5a: single-channel color-dodge result.
    pub sketch_gray: GrayImage,
    /// Stage 5b: the sketch replicated into three channels.
    pub sketch: RgbImage,
    /// The clamped parameters that were actually applied.
    pub parameters: SketchParameters,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

/// Errors that can occur in the sketch pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input bytes were empty or the image has zero area.
    #[error("input image data is empty")]
    EmptyInput,

    /// A parameter was outside its valid range (strict construction only).
    #[error("invalid sketch parameter: {name} = {value} is outside [{min}, {max}]")]
    InvalidParameter {
        /// Field name.
        name: &'static str,
        /// Rejected value.
        value: f32,
        /// Lower bound (inclusive).
        min: f32,
        /// Upper bound (inclusive).
        max: f32,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Dimensions tests ---

    #[test]
    fn dimensions_of_buffer() {
        let img = GrayImage::new(7, 3);
        let dims = Dimensions::of(&img);
        assert_eq!(
            dims,
            Dimensions {
                width: 7,
                height: 3
            }
        );
        assert_eq!(dims.pixel_count(), 21);
        assert!(!dims.is_empty());
    }

    #[test]
    fn dimensions_zero_axis_is_empty() {
        assert!(Dimensions { width: 0, height: 5 }.is_empty());
        assert!(Dimensions { width: 5, height: 0 }.is_empty());
    }

    // --- SketchParameters tests ---

    #[test]
    fn default_parameters_are_identity_tone_and_classic_kernel() {
        let p = SketchParameters::default();
        assert!((p.contrast - 1.0).abs() < f32::EPSILON);
        assert!((p.brightness - 1.0).abs() < f32::EPSILON);
        assert_eq!(p.kernel_size(), 21);
    }

    #[test]
    fn kernel_size_covers_thickness_range() {
        assert_eq!(SketchParameters::new(1.0, 1.0, 1.0).kernel_size(), 3);
        assert_eq!(SketchParameters::new(5.0, 1.0, 1.0).kernel_size(), 11);
        assert_eq!(SketchParameters::new(10.0, 1.0, 1.0).kernel_size(), 21);
    }

    #[test]
    fn kernel_size_rounds_and_clamps() {
        assert_eq!(SketchParameters::new(4.4, 1.0, 1.0).kernel_size(), 9);
        assert_eq!(SketchParameters::new(4.6, 1.0, 1.0).kernel_size(), 11);
        assert_eq!(SketchParameters::new(0.0, 1.0, 1.0).kernel_size(), 3);
        assert_eq!(SketchParameters::new(-3.0, 1.0, 1.0).kernel_size(), 3);
        assert_eq!(SketchParameters::new(99.0, 1.0, 1.0).kernel_size(), 21);
    }

    #[test]
    fn kernel_size_is_always_odd() {
        for tenth in 0..=120 {
            #[allow(clippy::cast_precision_loss)]
            let t = tenth as f32 / 10.0;
            let k = SketchParameters::new(t, 1.0, 1.0).kernel_size();
            assert_eq!(k % 2, 1, "kernel {k} for thickness {t} is even");
            assert!((3..=21).contains(&k));
        }
    }

    #[test]
    fn clamped_pulls_values_into_range() {
        let p = SketchParameters::new(42.0, 0.0, 5.0).clamped();
        assert!((p.line_thickness - 10.0).abs() < f32::EPSILON);
        assert!((p.contrast - 0.1).abs() < f32::EPSILON);
        assert!((p.brightness - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn clamped_replaces_non_finite_with_defaults() {
        let p = SketchParameters::new(f32::NAN, f32::INFINITY, f32::NEG_INFINITY).clamped();
        assert_eq!(p, SketchParameters::default());
    }

    #[test]
    fn clamped_keeps_in_range_values() {
        let p = SketchParameters::new(3.0, 1.5, 0.5);
        assert_eq!(p.clamped(), p);
    }

    #[test]
    fn try_new_accepts_bounds() {
        assert!(SketchParameters::try_new(1.0, 0.1, 0.1).is_ok());
        assert!(SketchParameters::try_new(10.0, 2.0, 2.0).is_ok());
    }

    #[test]
    fn try_new_rejects_out_of_range() {
        let err = SketchParameters::try_new(5.0, 2.5, 1.0);
        assert!(matches!(
            err,
            Err(PipelineError::InvalidParameter {
                name: "contrast",
                ..
            })
        ));

        let err = SketchParameters::try_new(0.5, 1.0, 1.0);
        assert!(matches!(
            err,
            Err(PipelineError::InvalidParameter {
                name: "line_thickness",
                ..
            })
        ));

        let err = SketchParameters::try_new(5.0, 1.0, f32::NAN);
        assert!(matches!(
            err,
            Err(PipelineError::InvalidParameter {
                name: "brightness",
                ..
            })
        ));
    }

    #[test]
    fn parameters_serde_round_trip() {
        let p = SketchParameters::new(4.0, 1.3, 0.7);
        let json = serde_json::to_string(&p).unwrap();
        let back: SketchParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn parameters_deserialize_missing_fields_as_default() {
        let p: SketchParameters = serde_json::from_str(r#"{"contrast": 1.5}"#).unwrap();
        assert!((p.contrast - 1.5).abs() < f32::EPSILON);
        assert!((p.brightness - 1.0).abs() < f32::EPSILON);
        assert!((p.line_thickness - 10.0).abs() < f32::EPSILON);
    }

    // --- PipelineError tests ---

    #[test]
    fn invalid_parameter_message_names_field() {
        let err = PipelineError::InvalidParameter {
            name: "contrast",
            value: 3.0,
            min: 0.1,
            max: 2.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("contrast"), "got {msg}");
        assert!(msg.contains('3'), "got {msg}");
    }

    #[test]
    fn empty_input_message() {
        assert_eq!(
            PipelineError::EmptyInput.to_string(),
            "input image data is empty"
        );
    }
}
