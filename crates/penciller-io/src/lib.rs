//! penciller-io: Filesystem boundary for the penciller pipeline.
//!
//! Loads source images from disk, saves sketches in the format implied
//! by the output extension, and produces preview thumbnails. All pixel
//! work is delegated to `penciller-pipeline`.

pub mod load;
pub mod preview;
pub mod save;

use std::path::Path;

use penciller_pipeline::{PipelineError, RgbImage, SketchParameters};
use tracing::instrument;

pub use load::{DecodeError, load, read_bytes};
pub use preview::{DEFAULT_PREVIEW_SIZE, PreviewFilter, thumbnail};
pub use save::{DEFAULT_JPEG_QUALITY, EncodeError, OutputFormat, encode, save};

/// Any error raised while turning an image file into a sketch file.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Loading the source failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Saving the output failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The pipeline rejected the image.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Load `input`, convert it, and save the sketch to `output`.
///
/// The output format is checked before any work is done, so an
/// unsupported extension fails fast. Returns the sketch so callers can
/// derive previews from it.
///
/// # Errors
///
/// Returns [`IoError::Encode`] for an unsupported output extension or a
/// failed write, [`IoError::Decode`] if the input cannot be loaded, and
/// [`IoError::Pipeline`] if the image has zero area.
#[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
pub fn sketch_file(
    input: &Path,
    output: &Path,
    parameters: &SketchParameters,
    jpeg_quality: u8,
) -> Result<RgbImage, IoError> {
    OutputFormat::from_path(output)?;
    let image = load(input)?;
    let sketch = penciller_pipeline::convert(&image, parameters)?;
    save(output, &sketch, jpeg_quality)?;
    Ok(sketch)
}
