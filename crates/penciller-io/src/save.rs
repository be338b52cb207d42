//! Encoding sketches and writing them to disk.
//!
//! The output format is chosen from the file extension: `.png`, `.jpg` /
//! `.jpeg`, or `.bmp`, case-insensitive. A path without an extension is
//! written as PNG.

use std::fmt;
use std::path::{Path, PathBuf};

use image::ImageEncoder;
use penciller_pipeline::RgbImage;
use tracing::{info, instrument};

/// Default JPEG quality when none is given.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Errors that can occur while encoding or writing an output image.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The output extension does not name a supported format.
    #[error("unsupported output format: .{extension} (expected .png, .jpg, .jpeg, or .bmp)")]
    UnsupportedFormat {
        /// The offending extension, without the dot.
        extension: String,
    },

    /// The encoder rejected the image.
    #[error("image encoding failed: {0}")]
    Codec(#[from] image::ImageError),

    /// The encoded bytes could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Supported output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossless PNG.
    Png,
    /// Lossy JPEG.
    Jpeg,
    /// Uncompressed Windows bitmap.
    Bmp,
}

impl OutputFormat {
    /// Pick the format from a path's extension.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::UnsupportedFormat`] for any extension other
    /// than `png`, `jpg`, `jpeg`, or `bmp`.
    pub fn from_path(path: &Path) -> Result<Self, EncodeError> {
        let Some(extension) = path.extension() else {
            return Ok(Self::Png);
        };
        let extension = extension.to_string_lossy();
        match extension.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "bmp" => Ok(Self::Bmp),
            _ => Err(EncodeError::UnsupportedFormat {
                extension: extension.into_owned(),
            }),
        }
    }

    /// Canonical file extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => f.write_str("PNG"),
            Self::Jpeg => f.write_str("JPEG"),
            Self::Bmp => f.write_str("BMP"),
        }
    }
}

/// Encode an RGB image into an in-memory buffer.
///
/// `jpeg_quality` is only used for [`OutputFormat::Jpeg`] and is clamped
/// to `1..=100`.
///
/// # Errors
///
/// Returns [`EncodeError::Codec`] if the encoder fails.
pub fn encode(
    image: &RgbImage,
    format: OutputFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::new();
    let (w, h) = image.dimensions();
    let color = image::ExtendedColorType::Rgb8;
    match format {
        OutputFormat::Png => {
            let encoder = image::codecs::png::PngEncoder::new(&mut bytes);
            encoder.write_image(image.as_raw(), w, h, color)?;
        }
        OutputFormat::Jpeg => {
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut bytes,
                jpeg_quality.clamp(1, 100),
            );
            encoder.write_image(image.as_raw(), w, h, color)?;
        }
        OutputFormat::Bmp => {
            let encoder = image::codecs::bmp::BmpEncoder::new(&mut bytes);
            encoder.write_image(image.as_raw(), w, h, color)?;
        }
    }
    Ok(bytes)
}

/// Encode `image` in the format implied by `path` and write it there.
///
/// Returns the format that was written.
///
/// # Errors
///
/// Returns [`EncodeError::UnsupportedFormat`] for an unknown extension,
/// [`EncodeError::Codec`] if encoding fails, and [`EncodeError::Write`]
/// if the file cannot be written.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn save(path: &Path, image: &RgbImage, jpeg_quality: u8) -> Result<OutputFormat, EncodeError> {
    let format = OutputFormat::from_path(path)?;
    let bytes = encode(image, format, jpeg_quality)?;
    std::fs::write(path, &bytes).map_err(|source| EncodeError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(%format, bytes = bytes.len(), "saved image");
    Ok(format)
}
