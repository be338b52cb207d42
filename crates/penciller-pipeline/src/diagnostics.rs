//! Pipeline diagnostics: timing, intensities, and other metrics for each
//! stage.
//!
//! [`process_staged_with_diagnostics`] runs the full pipeline and reports
//! how long each stage took alongside what it produced. Timing goes
//! through the caller-supplied [`Clock`] so the pipeline stays free of
//! platform time sources.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::pipeline::Pipeline;
use crate::types::{GrayImage, PipelineError, SketchParameters, StagedResult};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Monotonic time source used to measure stage durations.
///
/// Native callers implement this over [`std::time::Instant`]; tests use
/// a fake clock that advances deterministically.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: image decoding.
    pub decode: StageDiagnostics,
    /// Stage 2: contrast and brightness.
    pub tone: StageDiagnostics,
    /// Stage 3: grayscale conversion.
    pub grayscale: StageDiagnostics,
    /// Stage 4: Gaussian blur and inversion.
    pub blur: StageDiagnostics,
    /// Stage 5: color dodge.
    pub dodge: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the encoded input, or `None` when the pipeline started
        /// from an already-decoded image.
        input_bytes: Option<usize>,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// Contrast and brightness metrics.
    Tone {
        /// Contrast factor (after clamping).
        contrast: f32,
        /// Brightness factor (after clamping).
        brightness: f32,
        /// Mean sample value of the decoded image.
        mean_before: f64,
        /// Mean sample value after adjustment.
        mean_after: f64,
    },
    /// Grayscale conversion metrics.
    Grayscale {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Mean luma.
        mean_intensity: f64,
    },
    /// Blur and inversion metrics.
    Blur {
        /// Square kernel side length.
        kernel_size: u32,
        /// Gaussian sigma derived from the kernel size.
        sigma: f64,
        /// Mean value of the inverted blur.
        mean_inverted: f64,
    },
    /// Color dodge metrics.
    Dodge {
        /// Pixels that saturated to pure white.
        white_pixel_count: u64,
        /// Total pixel count for computing the white fraction.
        total_pixel_count: u64,
    },
}

/// High-level summary for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Parameters actually used (after clamping).
    pub parameters: SketchParameters,
    /// Fraction of output pixels that are pure white, in `0.0..=1.0`.
    pub white_fraction: f64,
}

impl PipelineDiagnostics {
    /// Stages in execution order with their display names.
    #[must_use]
    pub fn stages(&self) -> [(&'static str, &StageDiagnostics); 5] {
        [
            ("Decode", &self.decode),
            ("Tone", &self.tone),
            ("Grayscale", &self.grayscale),
            ("Blur + Invert", &self.blur),
            ("Dodge", &self.dodge),
        ]
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        let p = self.summary.parameters;
        lines.push(format!(
            "Parameters: line_thickness={:.2} contrast={:.2} brightness={:.2}",
            p.line_thickness, p.contrast, p.brightness,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "White pixels: {:.1}%",
            self.summary.white_fraction * 100.0,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes: Some(input_bytes),
            width,
            height,
            ..
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Decode {
            input_bytes: None,
            width,
            height,
            ..
        } => format!("in-memory {width}x{height}"),
        StageMetrics::Tone {
            contrast,
            brightness,
            mean_before,
            mean_after,
        } => format!(
            "contrast={contrast:.2} brightness={brightness:.2} mean {mean_before:.1}->{mean_after:.1}",
        ),
        StageMetrics::Grayscale {
            width,
            height,
            mean_intensity,
        } => format!("{width}x{height} mean={mean_intensity:.1}"),
        StageMetrics::Blur {
            kernel_size,
            sigma,
            mean_inverted,
        } => format!(
            "kernel={kernel_size}x{kernel_size} sigma={sigma:.2} inverted mean={mean_inverted:.1}",
        ),
        StageMetrics::Dodge {
            white_pixel_count,
            total_pixel_count,
        } => format!(
            "white={white_pixel_count}/{total_pixel_count} ({:.1}%)",
            white_fraction(*white_pixel_count, *total_pixel_count) * 100.0,
        ),
    }
}

/// `white / total`, or `0.0` for an empty image.
#[allow(clippy::cast_precision_loss)]
fn white_fraction(white: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        white as f64 / total as f64
    }
}

/// Mean of a run of 8-bit samples, or `0.0` when empty.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean_intensity(samples: &[u8]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: u64 = samples.iter().map(|&s| u64::from(s)).sum();
    sum as f64 / samples.len() as f64
}

/// Count pure-white pixels in a grayscale image.
pub(crate) fn count_white_pixels(image: &GrayImage) -> u64 {
    image
        .pixels()
        .map(|p| u64::from(u8::from(p.0[0] == u8::MAX)))
        .sum()
}

/// Run the pipeline on encoded bytes and collect per-stage diagnostics.
///
/// Produces the same [`StagedResult`] as [`crate::process_staged`].
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] or [`PipelineError::ImageDecode`]
/// if the bytes cannot be decoded.
#[instrument(skip_all, fields(input_bytes = image_bytes.len()))]
pub fn process_staged_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    parameters: &SketchParameters,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let pipeline_start = clock.now();

    let start = clock.now();
    let decoded = Pipeline::new(image_bytes.to_vec(), *parameters).decode()?;
    let decode = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: decoded.stage_metrics(),
    };

    let start = clock.now();
    let toned = decoded.adjust_tone();
    let tone = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: toned.stage_metrics(),
    };

    let start = clock.now();
    let grayscaled = toned.grayscale();
    let grayscale = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: grayscaled.stage_metrics(),
    };

    let start = clock.now();
    let blurred = grayscaled.blur_and_invert();
    let blur = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: blurred.stage_metrics(),
    };

    let start = clock.now();
    let sketched = blurred.dodge();
    let dodge = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: sketched.stage_metrics(),
    };

    let result = sketched.into_result();
    let total_duration = clock.elapsed(&pipeline_start);

    let white = white_fraction(
        count_white_pixels(&result.sketch_gray),
        result.dimensions.pixel_count(),
    );

    let summary = PipelineSummary {
        image_width: result.dimensions.width,
        image_height: result.dimensions.height,
        pixel_count: result.dimensions.pixel_count(),
        parameters: result.parameters,
        white_fraction: white,
    };

    debug!(
        total_ms = duration_ms(total_duration),
        white_fraction = white,
        "pipeline diagnostics collected"
    );

    Ok((
        result,
        PipelineDiagnostics {
            decode,
            tone,
            grayscale,
            blur,
            dodge,
            total_duration,
            summary,
        },
    ))
}
