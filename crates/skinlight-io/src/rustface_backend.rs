//! Frontal face detection backed by the `rustface` crate (SeetaFace
//! engine).

use std::path::Path;

use skinlight_pipeline::{FaceCandidate, FaceDetector, GrayImage};

use crate::AnalyzeError;

/// Detection score threshold.
const SCORE_THRESHOLD: f64 = 2.0;

/// Image pyramid scale step between detection passes.
const PYRAMID_SCALE_FACTOR: f32 = 0.8;

/// Sliding window step in pixels.
const WINDOW_STEP: u32 = 4;

/// Face detector using a SeetaFace frontal model loaded from disk.
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    /// Load a SeetaFace model file (e.g. `seeta_fd_frontal_v1.0.bin`).
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzeError::FaceModel`] if the file cannot be read or
    /// is not a valid model.
    pub fn from_file(path: &Path) -> Result<Self, AnalyzeError> {
        let model_error = |reason: String| AnalyzeError::FaceModel {
            path: path.to_path_buf(),
            reason,
        };
        let bytes = std::fs::read(path).map_err(|e| model_error(e.to_string()))?;
        let model = rustface::read_model(std::io::Cursor::new(bytes))
            .map_err(|e| model_error(e.to_string()))?;
        Ok(Self { model })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, gray: &GrayImage, min_size: u32) -> Vec<FaceCandidate> {
        // The engine keeps per-run state, so each call gets its own.
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(min_size);
        detector.set_score_thresh(SCORE_THRESHOLD);
        detector.set_pyramid_scale_factor(PYRAMID_SCALE_FACTOR);
        detector.set_slide_window_step(WINDOW_STEP, WINDOW_STEP);

        let image = rustface::ImageData::new(gray.as_raw(), gray.width(), gray.height());
        detector
            .detect(&image)
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceCandidate {
                    x: i64::from(bbox.x()),
                    y: i64::from(bbox.y()),
                    width: i64::from(bbox.width()),
                    height: i64::from(bbox.height()),
                }
            })
            .collect()
    }
}
