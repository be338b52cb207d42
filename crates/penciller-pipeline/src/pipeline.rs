//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::convert`] which runs the whole transform in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use penciller_pipeline::{Pipeline, SketchParameters, PipelineError};
//! # fn run(png: Vec<u8>) -> Result<(), PipelineError> {
//! let staged = Pipeline::new(png, SketchParameters::default())
//!     .decode()?
//!     .adjust_tone()
//!     .grayscale()
//!     .blur_and_invert()
//!     .dodge()
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state,
//! carrying all previously computed intermediates. Only decoding can
//! fail; every later stage is total.
//!
//! # Memory
//!
//! The final [`Sketched`] stage holds three RGB and five grayscale
//! buffers of the source size. Callers that only need the output should
//! use [`Sketched::into_sketch`] or [`crate::convert`], which drop the
//! intermediates.

use tracing::debug;

use crate::blur::BlurKernel;
use crate::diagnostics::{StageMetrics, count_white_pixels, mean_intensity};
use crate::types::{
    Dimensions, DynamicImage, GrayImage, PipelineError, RgbImage, SketchParameters, StagedResult,
};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// The source image bytes and parameters are stored but not yet touched.
/// Call [`decode`](Self::decode) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .decode() to continue"]
pub struct Pending {
    parameters: SketchParameters,
    source: Vec<u8>,
}

impl Pending {
    /// The raw source image bytes.
    #[must_use]
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Decode the source image and advance to the [`Decoded`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] if the source bytes are
    /// empty or decode to a zero-area image. Returns
    /// [`PipelineError::ImageDecode`] if the image format is
    /// unrecognized or the data is corrupt.
    pub fn decode(self) -> Result<Decoded, PipelineError> {
        let source_len = self.source.len();
        let image = crate::grayscale::decode(&self.source)?;
        let original = crate::grayscale::to_rgb(&image);
        debug!(
            source_len,
            width = original.width(),
            height = original.height(),
            "decoded source image"
        );
        Ok(Decoded::new(original, self.parameters, Some(source_len)))
    }
}

// ───────────────────────── Stage 1: Decoded ──────────────────────────

/// Pipeline state after decoding, with the source normalized to RGB.
///
/// Parameters are clamped on entry to this stage. Call
/// [`adjust_tone`](Self::adjust_tone) to advance.
#[must_use = "pipeline stages are consumed by advancing; call .adjust_tone() to continue"]
pub struct Decoded {
    parameters: SketchParameters,
    original: RgbImage,
    source_len: Option<usize>,
}

impl Decoded {
    fn new(original: RgbImage, parameters: SketchParameters, source_len: Option<usize>) -> Self {
        Self {
            parameters: parameters.clamped(),
            original,
            source_len,
        }
    }

    /// The decoded source as RGB.
    #[must_use]
    pub const fn original(&self) -> &RgbImage {
        &self.original
    }

    /// The clamped parameters the remaining stages will use.
    #[must_use]
    pub const fn parameters(&self) -> SketchParameters {
        self.parameters
    }

    /// Apply contrast then brightness and advance to [`Toned`].
    pub fn adjust_tone(self) -> Toned {
        let toned = crate::tone::adjust_tone(
            &self.original,
            self.parameters.contrast,
            self.parameters.brightness,
        );
        debug!(
            contrast = self.parameters.contrast,
            brightness = self.parameters.brightness,
            "adjusted tone"
        );
        Toned {
            parameters: self.parameters,
            original: self.original,
            toned,
        }
    }

    /// Metrics describing what this stage computed.
    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        let dimensions = Dimensions::of(&self.original);
        StageMetrics::Decode {
            input_bytes: self.source_len,
            width: dimensions.width,
            height: dimensions.height,
            pixel_count: dimensions.pixel_count(),
        }
    }
}

// ───────────────────────── Stage 2: Toned ────────────────────────────

/// Pipeline state after contrast and brightness adjustment.
///
/// Call [`grayscale`](Self::grayscale) to advance.
#[must_use = "pipeline stages are consumed by advancing; call .grayscale() to continue"]
pub struct Toned {
    parameters: SketchParameters,
    original: RgbImage,
    toned: RgbImage,
}

impl Toned {
    /// The tone-adjusted RGB image.
    #[must_use]
    pub const fn toned(&self) -> &RgbImage {
        &self.toned
    }

    /// Convert to luma and advance to [`Grayscaled`].
    pub fn grayscale(self) -> Grayscaled {
        let gray = crate::grayscale::to_grayscale(&self.toned);
        debug!("converted to grayscale");
        Grayscaled {
            parameters: self.parameters,
            original: self.original,
            toned: self.toned,
            gray,
        }
    }

    /// Metrics describing what this stage computed.
    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Tone {
            contrast: self.parameters.contrast,
            brightness: self.parameters.brightness,
            mean_before: mean_intensity(&self.original),
            mean_after: mean_intensity(&self.toned),
        }
    }
}

// ───────────────────────── Stage 3: Grayscaled ───────────────────────

/// Pipeline state after grayscale conversion.
///
/// Call [`blur_and_invert`](Self::blur_and_invert) to advance.
#[must_use = "pipeline stages are consumed by advancing; call .blur_and_invert() to continue"]
pub struct Grayscaled {
    parameters: SketchParameters,
    original: RgbImage,
    toned: RgbImage,
    gray: GrayImage,
}

impl Grayscaled {
    /// The grayscale image.
    #[must_use]
    pub const fn gray(&self) -> &GrayImage {
        &self.gray
    }

    /// Blur with the kernel implied by `line_thickness`, invert, and
    /// advance to [`Blurred`].
    pub fn blur_and_invert(self) -> Blurred {
        let kernel = BlurKernel::from_size(self.parameters.kernel_size());
        let (blurred, inverted) = crate::blur::blur_and_invert(&self.gray, kernel);
        debug!(
            kernel_size = kernel.size(),
            sigma = kernel.sigma(),
            "blurred and inverted"
        );
        Blurred {
            parameters: self.parameters,
            original: self.original,
            toned: self.toned,
            gray: self.gray,
            kernel,
            blurred,
            inverted,
        }
    }

    /// Metrics describing what this stage computed.
    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Grayscale {
            width: self.gray.width(),
            height: self.gray.height(),
            mean_intensity: mean_intensity(&self.gray),
        }
    }
}

// ───────────────────────── Stage 4: Blurred ──────────────────────────

/// Pipeline state after Gaussian blur and inversion.
///
/// Call [`dodge`](Self::dodge) to advance.
#[must_use = "pipeline stages are consumed by advancing; call .dodge() to continue"]
pub struct Blurred {
    parameters: SketchParameters,
    original: RgbImage,
    toned: RgbImage,
    gray: GrayImage,
    kernel: BlurKernel,
    blurred: GrayImage,
    inverted: GrayImage,
}

impl Blurred {
    /// The blurred grayscale image.
    #[must_use]
    pub const fn blurred(&self) -> &GrayImage {
        &self.blurred
    }

    /// The inverted blur (`255 - blurred`).
    #[must_use]
    pub const fn inverted(&self) -> &GrayImage {
        &self.inverted
    }

    /// The kernel that was applied.
    #[must_use]
    pub const fn kernel(&self) -> BlurKernel {
        self.kernel
    }

    /// Color-dodge the grayscale by the inverted blur and advance to
    /// [`Sketched`].
    pub fn dodge(self) -> Sketched {
        let sketch_gray = crate::dodge::color_dodge(&self.gray, &self.inverted);
        let sketch = crate::dodge::replicate_to_rgb(&sketch_gray);
        debug!("applied color dodge");
        Sketched {
            parameters: self.parameters,
            original: self.original,
            toned: self.toned,
            gray: self.gray,
            blurred: self.blurred,
            inverted: self.inverted,
            sketch_gray,
            sketch,
        }
    }

    /// Metrics describing what this stage computed.
    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Blur {
            kernel_size: self.kernel.size(),
            sigma: self.kernel.sigma(),
            mean_inverted: mean_intensity(&self.inverted),
        }
    }
}

// ───────────────────────── Stage 5: Sketched ─────────────────────────

/// Pipeline state after the color dodge, the final stage.
///
/// Call [`into_result`](Self::into_result) to extract every intermediate
/// or [`into_sketch`](Self::into_sketch) for just the output.
#[must_use = "call .into_result() or .into_sketch() to extract the output"]
pub struct Sketched {
    parameters: SketchParameters,
    original: RgbImage,
    toned: RgbImage,
    gray: GrayImage,
    blurred: GrayImage,
    inverted: GrayImage,
    sketch_gray: GrayImage,
    sketch: RgbImage,
}

impl Sketched {
    /// The final three-channel sketch.
    #[must_use]
    pub const fn sketch(&self) -> &RgbImage {
        &self.sketch
    }

    /// The single-channel sketch before replication.
    #[must_use]
    pub const fn sketch_gray(&self) -> &GrayImage {
        &self.sketch_gray
    }

    /// Image dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.sketch)
    }

    /// Consume the pipeline and return only the final sketch.
    #[must_use]
    pub fn into_sketch(self) -> RgbImage {
        self.sketch
    }

    /// Consume the pipeline and return the full [`StagedResult`].
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        let dimensions = Dimensions::of(&self.original);
        StagedResult {
            original: self.original,
            toned: self.toned,
            grayscale: self.gray,
            blurred: self.blurred,
            inverted: self.inverted,
            sketch_gray: self.sketch_gray,
            sketch: self.sketch,
            parameters: self.parameters,
            dimensions,
        }
    }

    /// Metrics describing what this stage computed.
    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Dodge {
            white_pixel_count: count_white_pixels(&self.sketch_gray),
            total_pixel_count: Dimensions::of(&self.sketch_gray).pixel_count(),
        }
    }
}

// ──────────────────── PipelineStage trait + Stage enum ────────────────

/// Total number of stages in the pipeline.
pub const STAGE_COUNT: usize = 6;

/// The output produced by a single pipeline stage.
///
/// Each variant borrows the data that the corresponding stage computed.
#[must_use]
pub enum StageOutput<'a> {
    /// Source image bytes (not yet decoded).
    Source {
        /// The raw image bytes.
        bytes: &'a [u8],
    },
    /// Decoded RGB image.
    Decoded {
        /// The original image.
        original: &'a RgbImage,
    },
    /// Tone-adjusted RGB image.
    Toned {
        /// The adjusted image.
        toned: &'a RgbImage,
    },
    /// Grayscale image.
    Grayscaled {
        /// The luma image.
        gray: &'a GrayImage,
    },
    /// Blur and inversion result.
    Blurred {
        /// The blurred image.
        blurred: &'a GrayImage,
        /// The inverted blur.
        inverted: &'a GrayImage,
    },
    /// Final sketch.
    Sketched {
        /// The three-channel sketch.
        sketch: &'a RgbImage,
    },
}

/// Trait implemented by every pipeline stage, enabling uniform iteration.
///
/// Each stage struct implements it, and [`Stage`] delegates to whichever
/// variant it holds.
pub trait PipelineStage: Sized {
    /// Human-readable name of this stage (e.g. `"source"`, `"blur"`).
    const NAME: &str;

    /// Zero-based index of this stage (`0` for Pending through `5` for
    /// Sketched).
    const INDEX: usize;

    /// The output this stage produced.
    fn output(&self) -> StageOutput<'_>;

    /// Stage-specific metrics for diagnostics.
    ///
    /// Returns `None` for the initial [`Pending`] stage which has not
    /// yet performed any processing.
    fn metrics(&self) -> Option<StageMetrics>;

    /// Advance to the next stage.
    ///
    /// Returns `Ok(Some(stage))` on success, `Ok(None)` if already at
    /// the final stage, or `Err` if the stage transition fails.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] or
    /// [`PipelineError::ImageDecode`] when decoding fails.
    fn next(self) -> Result<Option<Stage>, PipelineError>;

    /// Run all remaining stages to completion and return the final
    /// [`StagedResult`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if decoding is still pending and fails.
    fn complete(self) -> Result<StagedResult, PipelineError>;
}

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Source {
            bytes: &self.source,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Decoded(self.decode()?)))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.decode()?.complete()
    }
}

impl PipelineStage for Decoded {
    const NAME: &str = "decode";
    const INDEX: usize = 1;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Decoded {
            original: &self.original,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Toned(self.adjust_tone())))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.adjust_tone().complete()
    }
}

impl PipelineStage for Toned {
    const NAME: &str = "tone";
    const INDEX: usize = 2;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Toned {
            toned: &self.toned,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Grayscaled(self.grayscale())))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.grayscale().complete()
    }
}

impl PipelineStage for Grayscaled {
    const NAME: &str = "grayscale";
    const INDEX: usize = 3;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Grayscaled { gray: &self.gray }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Blurred(self.blur_and_invert())))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.blur_and_invert().complete()
    }
}

impl PipelineStage for Blurred {
    const NAME: &str = "blur";
    const INDEX: usize = 4;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Blurred {
            blurred: &self.blurred,
            inverted: &self.inverted,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Sketched(self.dodge())))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.dodge().complete()
    }
}

impl PipelineStage for Sketched {
    const NAME: &str = "sketch";
    const INDEX: usize = 5;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Sketched {
            sketch: &self.sketch,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(None)
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        Ok(self.into_result())
    }
}

/// Enum wrapping all pipeline stages for uniform, loopable access.
///
/// Use [`From`] conversions to enter the dynamic API from any typed
/// stage, then call [`advance`](Self::advance) in a loop:
///
/// ```rust
/// # use penciller_pipeline::{Pipeline, SketchParameters, PipelineError};
/// # use penciller_pipeline::pipeline::{Stage, Advance};
/// # fn run(png: Vec<u8>) -> Result<(), PipelineError> {
/// let mut stage: Stage = Pipeline::new(png, SketchParameters::default()).into();
/// loop {
///     match stage.advance()? {
///         Advance::Next(next) => stage = next,
///         Advance::Complete(done) => { stage = done; break; }
///     }
/// }
/// let result = stage.complete()?;
/// # Ok(())
/// # }
/// ```
#[must_use]
pub enum Stage {
    /// See [`Pending`].
    Pending(Pending),
    /// See [`Decoded`].
    Decoded(Decoded),
    /// See [`Toned`].
    Toned(Toned),
    /// See [`Grayscaled`].
    Grayscaled(Grayscaled),
    /// See [`Blurred`].
    Blurred(Blurred),
    /// See [`Sketched`].
    Sketched(Sketched),
}

/// Compile-time guard: if a [`Stage`] variant is added, this match becomes
/// non-exhaustive and the build fails until [`STAGE_COUNT`] is revisited.
#[allow(dead_code, clippy::match_same_arms)]
const fn _stage_count_guard(s: &Stage) {
    match s {
        Stage::Pending(_)
        | Stage::Decoded(_)
        | Stage::Toned(_)
        | Stage::Grayscaled(_)
        | Stage::Blurred(_)
        | Stage::Sketched(_) => {}
    }
}

/// Result of [`Stage::advance`]: either the next stage or the
/// completed final stage returned unchanged.
#[must_use]
pub enum Advance {
    /// The pipeline advanced to this next stage.
    Next(Stage),
    /// The pipeline was already at the final stage and is returned unchanged.
    Complete(Stage),
}

/// Delegate a method call to whichever `Stage` variant is active.
macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            Self::Pending(s) => s.$method($($arg),*),
            Self::Decoded(s) => s.$method($($arg),*),
            Self::Toned(s) => s.$method($($arg),*),
            Self::Grayscaled(s) => s.$method($($arg),*),
            Self::Blurred(s) => s.$method($($arg),*),
            Self::Sketched(s) => s.$method($($arg),*),
        }
    };
}

impl Stage {
    /// Human-readable name of the current stage.
    #[must_use]
    pub fn name(&self) -> &'static str {
        delegate!(self, name)
    }

    /// Zero-based index of the current stage.
    #[must_use]
    pub fn index(&self) -> usize {
        delegate!(self, index)
    }

    /// The output this stage produced.
    pub fn output(&self) -> StageOutput<'_> {
        delegate!(self, output)
    }

    /// Stage-specific metrics for diagnostics.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        delegate!(self, metrics)
    }

    /// Whether the pipeline is at the final stage.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Sketched(_))
    }

    /// Advance to the next stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if decoding fails.
    pub fn next(self) -> Result<Option<Self>, PipelineError> {
        delegate!(self, next)
    }

    /// Advance to the next stage, returning `self` unchanged if
    /// already complete.
    ///
    /// Unlike [`next`](Self::next), which consumes the final stage and
    /// returns `Ok(None)`, this returns [`Advance::Complete`] with the
    /// final stage so [`complete`](Self::complete) can still be called.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if decoding fails.
    pub fn advance(self) -> Result<Advance, PipelineError> {
        if self.is_complete() {
            return Ok(Advance::Complete(self));
        }
        // Only the final stage yields `None`, and it returned above.
        #[allow(clippy::unreachable)]
        let next = self
            .next()?
            .unwrap_or_else(|| unreachable!("non-final stage returned None from next()"));
        Ok(Advance::Next(next))
    }

    /// Run all remaining stages to completion.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if decoding is still pending and fails.
    pub fn complete(self) -> Result<StagedResult, PipelineError> {
        delegate!(self, complete)
    }
}

// Private helper trait so the macro can call `.name()` and `.index()`
// on `&self`; associated constants aren't reachable through `self`.
trait StageMetadata {
    fn name(&self) -> &'static str;
    fn index(&self) -> usize;
}

impl<T: PipelineStage> StageMetadata for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn index(&self) -> usize {
        T::INDEX
    }
}

impl From<Pending> for Stage {
    fn from(s: Pending) -> Self {
        Self::Pending(s)
    }
}

impl From<Decoded> for Stage {
    fn from(s: Decoded) -> Self {
        Self::Decoded(s)
    }
}

impl From<Toned> for Stage {
    fn from(s: Toned) -> Self {
        Self::Toned(s)
    }
}

impl From<Grayscaled> for Stage {
    fn from(s: Grayscaled) -> Self {
        Self::Grayscaled(s)
    }
}

impl From<Blurred> for Stage {
    fn from(s: Blurred) -> Self {
        Self::Blurred(s)
    }
}

impl From<Sketched> for Stage {
    fn from(s: Sketched) -> Self {
        Self::Sketched(s)
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental sketch pipeline.
///
/// [`Pipeline::new`] starts from encoded bytes; [`Pipeline::from_image`]
/// and [`Pipeline::from_rgb`] start from an already-decoded image and
/// skip straight to [`Decoded`].
///
/// Each stage method consumes the current state and returns the next,
/// making it a compile-time error to skip stages or call them out of
/// order.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from source image bytes and parameters.
    ///
    /// No processing is performed. Call [`.decode()`](Pending::decode)
    /// (or convert to a [`Stage`] and loop) to begin.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(image_bytes: Vec<u8>, parameters: SketchParameters) -> Pending {
        Pending {
            parameters,
            source: image_bytes,
        }
    }

    /// Start from a decoded image of any color type.
    ///
    /// The image is normalized to RGB; the caller's image is not
    /// modified.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] if the image has zero area.
    pub fn from_image(
        image: &DynamicImage,
        parameters: SketchParameters,
    ) -> Result<Decoded, PipelineError> {
        Self::from_rgb(crate::grayscale::to_rgb(image), parameters)
    }

    /// Start from an owned RGB image.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] if the image has zero area.
    pub fn from_rgb(image: RgbImage, parameters: SketchParameters) -> Result<Decoded, PipelineError> {
        if Dimensions::of(&image).is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        Ok(Decoded::new(image, parameters, None))
    }
}
