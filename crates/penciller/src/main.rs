//! penciller: turn a photograph into a pencil sketch.
//!
//! Loads an image, runs the sketch pipeline with the given parameters,
//! and writes the result in the format implied by the output extension.
//! Optionally writes a preview thumbnail and prints per-stage
//! diagnostics.
//!
//! # Usage
//!
//! ```text
//! penciller [OPTIONS] <INPUT> -o <OUTPUT>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use penciller_io::{DecodeError, IoError, OutputFormat, PreviewFilter};
use penciller_pipeline::diagnostics::{Clock, process_staged_with_diagnostics};
use penciller_pipeline::{RgbImage, SketchParameters};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Convert a photograph into a pencil-sketch rendering.
///
/// Contrast is applied first, then brightness; the result is blurred,
/// inverted, and color-dodged against its own grayscale to leave dark
/// strokes along edges.
#[derive(Parser)]
#[command(name = "penciller", version)]
struct Cli {
    /// Source image (PNG, JPEG, BMP).
    input: PathBuf,

    /// Output path; the extension selects PNG, JPEG, or BMP (PNG if none).
    #[arg(short, long)]
    output: PathBuf,

    /// Line thickness (1-10); larger values widen the blur and the strokes.
    #[arg(long, default_value_t = SketchParameters::DEFAULT_LINE_THICKNESS)]
    line_thickness: f32,

    /// Contrast factor (0.1-2.0).
    #[arg(long, default_value_t = SketchParameters::DEFAULT_CONTRAST)]
    contrast: f32,

    /// Brightness factor (0.1-2.0).
    #[arg(long, default_value_t = SketchParameters::DEFAULT_BRIGHTNESS)]
    brightness: f32,

    /// Full parameter set as a JSON string.
    ///
    /// When provided, the individual parameter flags are ignored. Missing
    /// fields take their defaults.
    #[arg(long)]
    params_json: Option<String>,

    /// Also write a preview thumbnail, fitted inside 300x300, to this path.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Resampling filter for the preview thumbnail.
    #[arg(long, value_enum, default_value_t = Filter::Triangle)]
    preview_filter: Filter,

    /// JPEG quality (1-100), used when an output is `.jpg`/`.jpeg`.
    #[arg(long, default_value_t = penciller_io::DEFAULT_JPEG_QUALITY, value_parser = clap::builder::RangedU64ValueParser::<u8>::new().range(1..=100))]
    jpeg_quality: u8,

    /// Print per-stage timing and metrics to stdout.
    #[arg(long)]
    diagnostics: bool,

    /// Print diagnostics as JSON instead of a human-readable report.
    #[arg(long, requires = "diagnostics")]
    json: bool,

    /// Log filter (e.g. `warn`, `info`, `penciller_pipeline=debug`).
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Preview resampling filter selection.
#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    /// Nearest-neighbor (fastest, blocky).
    Nearest,
    /// Bilinear interpolation (fast, decent quality).
    Triangle,
    /// Bicubic Catmull-Rom (good quality).
    CatmullRom,
    /// Lanczos with 3 lobes (sharpest).
    Lanczos3,
}

impl From<Filter> for PreviewFilter {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Nearest => Self::Nearest,
            Filter::Triangle => Self::Triangle,
            Filter::CatmullRom => Self::CatmullRom,
            Filter::Lanczos3 => Self::Lanczos3,
        }
    }
}

/// Errors surfaced by the command-line shell.
#[derive(Debug, thiserror::Error)]
enum CliError {
    /// `--params-json` did not parse.
    #[error("error parsing --params-json: {0}")]
    ParamsJson(serde_json::Error),

    /// Diagnostics could not be serialized.
    #[error("error serializing diagnostics: {0}")]
    DiagnosticsJson(serde_json::Error),

    /// Loading, converting, or saving failed.
    #[error(transparent)]
    Io(#[from] IoError),
}

impl From<DecodeError> for CliError {
    fn from(err: DecodeError) -> Self {
        Self::Io(err.into())
    }
}

impl From<penciller_io::EncodeError> for CliError {
    fn from(err: penciller_io::EncodeError) -> Self {
        Self::Io(err.into())
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Install the global `tracing` subscriber writing to stderr.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build [`SketchParameters`] from CLI arguments.
///
/// `--params-json` wins over the individual flags.
fn parameters_from_cli(cli: &Cli) -> Result<SketchParameters, CliError> {
    if let Some(ref json) = cli.params_json {
        return serde_json::from_str(json).map_err(CliError::ParamsJson);
    }
    Ok(SketchParameters::new(
        cli.line_thickness,
        cli.contrast,
        cli.brightness,
    ))
}

/// Convert with diagnostics enabled and print the report.
fn convert_with_diagnostics(
    cli: &Cli,
    parameters: &SketchParameters,
) -> Result<RgbImage, CliError> {
    let bytes = penciller_io::read_bytes(&cli.input)?;
    let (staged, diagnostics) = process_staged_with_diagnostics(&bytes, parameters, &StdClock)
        .map_err(|err| DecodeError::from_pipeline(&cli.input, err))?;

    if cli.json {
        let json =
            serde_json::to_string_pretty(&diagnostics).map_err(CliError::DiagnosticsJson)?;
        println!("{json}");
    } else {
        println!("{}", diagnostics.report());
    }

    penciller_io::save(&cli.output, &staged.sketch, cli.jpeg_quality)?;
    Ok(staged.sketch)
}

fn write_preview(path: &Path, sketch: &RgbImage, cli: &Cli) -> Result<(), CliError> {
    let thumb = penciller_io::thumbnail(
        sketch,
        penciller_io::DEFAULT_PREVIEW_SIZE,
        cli.preview_filter.into(),
    );
    penciller_io::save(path, &thumb, cli.jpeg_quality)?;
    eprintln!(
        "Preview written to {} ({}x{})",
        path.display(),
        thumb.width(),
        thumb.height(),
    );
    Ok(())
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let requested = parameters_from_cli(cli)?;
    let parameters = requested.clamped();
    if parameters != requested {
        warn!(?requested, effective = ?parameters, "parameters clamped to supported ranges");
    }

    // Reject bad extensions before doing any work.
    let format = OutputFormat::from_path(&cli.output)?;
    if let Some(ref preview) = cli.preview {
        OutputFormat::from_path(preview)?;
    }

    let sketch = if cli.diagnostics {
        convert_with_diagnostics(cli, &parameters)?
    } else {
        penciller_io::sketch_file(&cli.input, &cli.output, &parameters, cli.jpeg_quality)?
    };
    info!(%format, width = sketch.width(), height = sketch.height(), "sketch complete");
    eprintln!(
        "Sketch written to {} ({format}, {}x{})",
        cli.output.display(),
        sketch.width(),
        sketch.height(),
    );

    if let Some(ref preview) = cli.preview {
        write_preview(preview, &sketch, cli)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
