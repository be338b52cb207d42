//! Loading source images from the filesystem.

use std::path::{Path, PathBuf};

use penciller_pipeline::{DynamicImage, PipelineError};
use tracing::{info, instrument};

/// Errors that can occur while loading a source image.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is empty or decodes to a zero-area image.
    #[error("{} contains no image data", .path.display())]
    Empty {
        /// Path that was read.
        path: PathBuf,
    },

    /// The data is not a supported image or is corrupt.
    #[error("failed to decode {}: {source}", .path.display())]
    Format {
        /// Path that was read.
        path: PathBuf,
        /// Underlying decode error.
        source: PipelineError,
    },
}

impl DecodeError {
    /// Attribute a pipeline decode failure to the file it came from.
    #[must_use]
    pub fn from_pipeline(path: &Path, err: PipelineError) -> Self {
        match err {
            PipelineError::EmptyInput => Self::Empty {
                path: path.to_path_buf(),
            },
            source => Self::Format {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Read the raw bytes of an image file.
///
/// # Errors
///
/// Returns [`DecodeError::Read`] if the file cannot be read and
/// [`DecodeError::Empty`] if it has no content.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, DecodeError> {
    let bytes = std::fs::read(path).map_err(|source| DecodeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(DecodeError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(bytes)
}

/// Load and decode an image file (PNG, JPEG, BMP).
///
/// # Errors
///
/// Returns [`DecodeError::Read`] if the file cannot be read,
/// [`DecodeError::Empty`] if it holds no pixels, and
/// [`DecodeError::Format`] if the content is not a decodable image.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<DynamicImage, DecodeError> {
    let bytes = read_bytes(path)?;
    let image = penciller_pipeline::grayscale::decode(&bytes)
        .map_err(|err| DecodeError::from_pipeline(path, err))?;
    info!(
        bytes = bytes.len(),
        width = image.width(),
        height = image.height(),
        "loaded image"
    );
    Ok(image)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(&dir.path().join("nope.png"));
        assert!(matches!(result, Err(DecodeError::Read { .. })));
    }

    #[test]
    fn empty_file_is_empty_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = load(file.path());
        assert!(matches!(result, Err(DecodeError::Empty { .. })));
    }

    #[test]
    fn text_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, DecodeError::Format { .. }));
        assert!(err.to_string().contains("notes.png"));
    }

    #[test]
    fn directory_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(dir.path()),
            Err(DecodeError::Read { .. })
        ));
    }
}
