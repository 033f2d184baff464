//! skinlight-pipeline: skin-condition analysis of a facial photograph
//! (sans-IO).
//!
//! Estimates three indices from one photo through:
//! decode -> face region -> optional brightness equalization ->
//! skin segmentation -> index computation -> visualization.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! bytes and images and returns structured data. Filesystem
//! interaction and face-detector backends live in `skinlight-io`.

pub mod color;
pub mod decode;
pub mod diagnostics;
pub mod face;
pub mod font;
pub mod indices;
pub mod light;
pub mod pipeline;
pub mod segment;
pub mod types;
pub mod visualize;

pub use decode::decode;
pub use diagnostics::{PipelineDiagnostics, analyze_with_diagnostics};
pub use face::{FaceCandidate, FaceDetector, MIN_FACE_SIZE};
pub use pipeline::Pipeline;
pub use types::{
    Analysis, AnalysisConfig, Band, BoundingBox, Dimensions, GrayImage, IndexScores,
    PipelineError, RegionSource, RgbImage,
};

/// Run the full analysis on an already decoded image.
///
/// # Pipeline steps
///
/// 1. Choose the region: the whole image, or (with `auto_face`) the
///    largest face reported by `detector`, falling back to a centred box
/// 2. Optional CLAHE brightness equalization of the region
/// 3. Skin segmentation (bilateral filter, HSV ∧ `YCrCb`, morphology)
/// 4. Redness, blemish and tone-uniformity indices
/// 5. Heatmap overlay plus gauge panel
///
/// # Errors
///
/// Returns [`PipelineError::EmptyRegion`] if the image (or the region
/// chosen from it) has no pixels.
pub fn analyze_image(
    image: &RgbImage,
    config: &AnalysisConfig,
    detector: Option<&dyn FaceDetector>,
) -> Result<Analysis, PipelineError> {
    Ok(Pipeline::from_image(image.clone(), *config)
        .locate(detector)?
        .normalize()
        .segment()
        .score()
        .visualize()
        .into_result())
}

/// Decode image bytes and run the full analysis.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty,
/// [`PipelineError::ImageDecode`] if the format is unrecognized or the
/// data corrupt, and [`PipelineError::EmptyRegion`] as
/// [`analyze_image`] does.
pub fn analyze_bytes(
    image_bytes: &[u8],
    config: &AnalysisConfig,
    detector: Option<&dyn FaceDetector>,
) -> Result<Analysis, PipelineError> {
    let image = decode(image_bytes)?;
    analyze_image(&image, config, detector)
}
