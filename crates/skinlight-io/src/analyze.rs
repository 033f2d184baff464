//! Whole-run orchestration: load, analyse, write outputs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use skinlight_export::{MetricsRecord, to_metrics_json, to_png};
use skinlight_pipeline::{
    AnalysisConfig, BoundingBox, FaceDetector, IndexScores, PipelineDiagnostics, PipelineError,
    RegionSource, RgbImage, analyze_with_diagnostics,
};
use tracing::{info, warn};

use crate::AnalyzeError;
use crate::fs::{load_error, read_image_bytes, write_file};

/// Where the visualization goes when the caller gives no path.
pub const DEFAULT_SAVE_PATH: &str = "outputs/result.png";

/// SeetaFace model looked up in the working directory when no
/// `face_model` is given.
pub const DEFAULT_FACE_MODEL: &str = "seeta_fd_frontal_v1.0.bin";

/// Options for [`analyze`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeOptions {
    /// Restrict analysis to the located face region.
    pub auto_face: bool,
    /// Equalize local brightness of the region before segmentation.
    pub light_comp: bool,
    /// Also write the metrics JSON document here.
    pub export_json: Option<PathBuf>,
    /// Keep the rendered visualization in the result.
    pub return_image: bool,
    /// SeetaFace model used for face detection. When unset,
    /// [`DEFAULT_FACE_MODEL`] is used if it exists; otherwise detection
    /// is skipped with a warning and the centred fallback box is used.
    pub face_model: Option<PathBuf>,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            auto_face: AnalysisConfig::DEFAULT_AUTO_FACE,
            light_comp: AnalysisConfig::DEFAULT_LIGHT_COMP,
            export_json: None,
            return_image: false,
            face_model: None,
        }
    }
}

impl AnalyzeOptions {
    /// The pipeline configuration these options select.
    #[must_use]
    pub const fn config(&self) -> AnalysisConfig {
        AnalysisConfig {
            auto_face: self.auto_face,
            light_comp: self.light_comp,
        }
    }
}

/// Outcome of one [`analyze`] run.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// The three indices (unrounded).
    pub scores: IndexScores,
    /// Where the visualization PNG was written.
    pub result_image: PathBuf,
    /// Where the metrics JSON was written, if requested.
    pub json_path: Option<PathBuf>,
    /// The rendered visualization, when `return_image` was set.
    pub visualization: Option<RgbImage>,
    /// Region of the source photo that was analysed.
    pub region: BoundingBox,
    /// How the region was chosen.
    pub region_source: RegionSource,
    /// Whether a detector actually reported a face.
    pub face_detected: bool,
    /// Whether the skin mask was too small and the whole region was
    /// sampled instead.
    pub sample_fallback: bool,
    /// Per-stage timings and metrics.
    pub diagnostics: PipelineDiagnostics,
}

/// Analyse the photo at `image_path` and write the visualization to
/// `save_path`.
///
/// The PNG is overwritten if it exists. With `export_json` set, the
/// metrics document is written as well. Output directories are created
/// only after the photo has loaded, so a bad input leaves no files
/// behind.
///
/// # Errors
///
/// - [`AnalyzeError::Load`] if the photo is missing, empty, or
///   undecodable
/// - [`AnalyzeError::FaceModel`] if `face_model` cannot be loaded
/// - [`AnalyzeError::Pipeline`] if the photo has no pixels to analyse
/// - [`AnalyzeError::CreateDir`] / [`AnalyzeError::Write`] on output
///   failures
pub fn analyze(
    image_path: &Path,
    save_path: &Path,
    options: &AnalyzeOptions,
) -> Result<AnalysisResult, AnalyzeError> {
    info!(image = %image_path.display(), "analyzing");
    let config = options.config();

    let bytes = read_image_bytes(image_path)?;
    let detector = load_detector(options)?;

    let (analysis, diagnostics) = analyze_with_diagnostics(bytes, &config, detector.as_deref())
        .map_err(|e| match e {
            PipelineError::EmptyInput | PipelineError::ImageDecode(_) => {
                load_error(image_path, e.to_string())
            }
            PipelineError::EmptyRegion { .. } => AnalyzeError::Pipeline(e),
        })?;

    info!(
        redness = analysis.scores.redness,
        blemish = analysis.scores.blemish,
        tone_uniformity = analysis.scores.tone_uniformity,
        "analysis complete"
    );

    write_file(save_path, to_png(&analysis.visualization)?)?;
    info!(path = %save_path.display(), "saved visualization");

    if let Some(json_path) = &options.export_json {
        let record = MetricsRecord::new(
            analysis.scores,
            image_path.display().to_string(),
            save_path.display().to_string(),
            &config,
        );
        write_file(json_path, to_metrics_json(&record)?)?;
        info!(path = %json_path.display(), "saved metrics");
    }

    Ok(AnalysisResult {
        scores: analysis.scores,
        result_image: save_path.to_path_buf(),
        json_path: options.export_json.clone(),
        visualization: options.return_image.then_some(analysis.visualization),
        region: analysis.region,
        region_source: analysis.region_source,
        face_detected: analysis.region_source == RegionSource::Detected,
        sample_fallback: analysis.sample_fallback,
        diagnostics,
    })
}

/// Build the face detector the options ask for, if any.
fn load_detector(options: &AnalyzeOptions) -> Result<Option<Box<dyn FaceDetector>>, AnalyzeError> {
    if !options.auto_face {
        return Ok(None);
    }
    if let Some(model) = &options.face_model {
        return detector_from_model(model).map(Some);
    }
    let default_model = Path::new(DEFAULT_FACE_MODEL);
    if cfg!(feature = "rustface") && default_model.is_file() {
        return detector_from_model(default_model).map(Some);
    }
    warn!(
        model = DEFAULT_FACE_MODEL,
        "no face model available, face detection skipped; using the centred fallback region"
    );
    Ok(None)
}

#[cfg(feature = "rustface")]
fn detector_from_model(path: &Path) -> Result<Box<dyn FaceDetector>, AnalyzeError> {
    tracing::debug!(model = %path.display(), "loading face model");
    Ok(Box::new(crate::RustfaceDetector::from_file(path)?))
}

#[cfg(not(feature = "rustface"))]
fn detector_from_model(path: &Path) -> Result<Box<dyn FaceDetector>, AnalyzeError> {
    Err(AnalyzeError::FaceModel {
        path: path.to_path_buf(),
        reason: "face detection support was not compiled in".to_owned(),
    })
}
