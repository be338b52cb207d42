//! penciller-pipeline: Pure pencil-sketch image pipeline (sans-IO).
//!
//! Turns a color photograph into a grayscale pencil sketch through:
//! tone adjustment -> grayscale -> Gaussian blur -> inversion ->
//! color dodge.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! images and byte slices. All filesystem interaction lives in
//! `penciller-io`.

pub mod blur;
pub mod diagnostics;
pub mod dodge;
pub mod grayscale;
pub mod pipeline;
pub mod sample;
pub mod tone;
pub mod types;

use tracing::instrument;

pub use blur::BlurKernel;
pub use pipeline::Pipeline;
pub use types::{
    Dimensions, DynamicImage, GrayImage, PipelineError, RgbImage, SketchParameters, StagedResult,
};

/// Convert a decoded image into a pencil sketch.
///
/// The result has the same dimensions as `image`, with three identical
/// channels. `image` is not modified. Parameters outside their ranges
/// are clamped.
///
/// # Pipeline steps
///
/// 1. Normalize to RGB
/// 2. Scale every sample by `contrast`, then by `brightness`
/// 3. BT.601 grayscale
/// 4. Gaussian blur with a kernel sized by `line_thickness`
/// 5. Invert the blur
/// 6. Color-dodge the grayscale by the inverted blur
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if the image has zero area.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn convert(
    image: &DynamicImage,
    parameters: &SketchParameters,
) -> Result<RgbImage, PipelineError> {
    Ok(Pipeline::from_image(image, *parameters)?
        .adjust_tone()
        .grayscale()
        .blur_and_invert()
        .dodge()
        .into_sketch())
}

/// Decode raw image bytes and convert them into a pencil sketch.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
#[instrument(skip_all, fields(input_bytes = image_bytes.len()))]
pub fn process(
    image_bytes: &[u8],
    parameters: &SketchParameters,
) -> Result<RgbImage, PipelineError> {
    Ok(Pipeline::new(image_bytes.to_vec(), *parameters)
        .decode()?
        .adjust_tone()
        .grayscale()
        .blur_and_invert()
        .dodge()
        .into_sketch())
}

/// Like [`process`], but keeps every intermediate image.
///
/// # Errors
///
/// Same as [`process`].
pub fn process_staged(
    image_bytes: &[u8],
    parameters: &SketchParameters,
) -> Result<StagedResult, PipelineError> {
    Ok(Pipeline::new(image_bytes.to_vec(), *parameters)
        .decode()?
        .adjust_tone()
        .grayscale()
        .blur_and_invert()
        .dodge()
        .into_result())
}
