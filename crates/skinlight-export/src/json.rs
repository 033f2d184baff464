//! Metrics JSON serializer.
//!
//! The document holds the three scores rounded to three decimals, the
//! source and output image paths, and the two analysis flags, in a fixed
//! field order:
//!
//! ```json
//! {
//!   "redness": 0.196,
//!   "blemish": 0.0,
//!   "tone_uniformity": 1.0,
//!   "image": "face.jpg",
//!   "result_image": "outputs/result.png",
//!   "auto_face": true,
//!   "light_comp": false
//! }
//! ```
//!
//! Output is pretty-printed with a two-space indent and no trailing
//! newline, so identical inputs always give byte-identical documents.

use serde::{Deserialize, Serialize};
use skinlight_pipeline::{AnalysisConfig, IndexScores};

use crate::ExportError;

/// One exported analysis, in serialization order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Redness index, rounded to three decimals.
    pub redness: f64,
    /// Blemish index, rounded to three decimals.
    pub blemish: f64,
    /// Tone-uniformity index, rounded to three decimals.
    pub tone_uniformity: f64,
    /// Source image path as given by the caller.
    pub image: String,
    /// Path the visualization was written to.
    pub result_image: String,
    /// Whether face location was enabled.
    pub auto_face: bool,
    /// Whether brightness equalization was enabled.
    pub light_comp: bool,
}

impl MetricsRecord {
    /// Build a record, rounding the scores for serialization.
    #[must_use]
    pub fn new(
        scores: IndexScores,
        image: impl Into<String>,
        result_image: impl Into<String>,
        config: &AnalysisConfig,
    ) -> Self {
        let rounded = scores.rounded();
        Self {
            redness: rounded.redness,
            blemish: rounded.blemish,
            tone_uniformity: rounded.tone_uniformity,
            image: image.into(),
            result_image: result_image.into(),
            auto_face: config.auto_face,
            light_comp: config.light_comp,
        }
    }
}

/// Serialize a record as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails (not expected
/// for finite scores).
pub fn to_metrics_json(record: &MetricsRecord) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(record)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scores() -> IndexScores {
        IndexScores {
            redness: 50.0 / 255.0,
            blemish: 0.0,
            tone_uniformity: 1.0,
        }
    }

    #[test]
    fn document_layout_is_fixed() {
        let config = AnalysisConfig {
            auto_face: false,
            light_comp: false,
        };
        let record = MetricsRecord::new(scores(), "in/face.png", "outputs/result.png", &config);
        let json = to_metrics_json(&record).unwrap();
        assert_eq!(
            json,
            "{\n  \"redness\": 0.196,\n  \"blemish\": 0.0,\n  \"tone_uniformity\": 1.0,\n  \
             \"image\": \"in/face.png\",\n  \"result_image\": \"outputs/result.png\",\n  \
             \"auto_face\": false,\n  \"light_comp\": false\n}",
        );
    }

    #[test]
    fn scores_are_rounded_to_three_decimals() {
        let record = MetricsRecord::new(
            IndexScores {
                redness: 0.123_456,
                blemish: 0.999_9,
                tone_uniformity: 0.000_49,
            },
            "a",
            "b",
            &AnalysisConfig::default(),
        );
        assert!((record.redness - 0.123).abs() < 1e-12);
        assert!((record.blemish - 1.0).abs() < 1e-12);
        assert!(record.tone_uniformity.abs() < 1e-12);
    }

    #[test]
    fn flags_come_from_config() {
        let config = AnalysisConfig {
            auto_face: true,
            light_comp: true,
        };
        let record = MetricsRecord::new(scores(), "a", "b", &config);
        assert!(record.auto_face);
        assert!(record.light_comp);
    }

    #[test]
    fn non_ascii_paths_are_kept_verbatim() {
        let record = MetricsRecord::new(
            scores(),
            "사진/얼굴.jpg",
            "outputs/result.png",
            &AnalysisConfig::default(),
        );
        let json = to_metrics_json(&record).unwrap();
        assert!(json.contains("\"image\": \"사진/얼굴.jpg\""));
    }

    #[test]
    fn identical_records_serialize_identically() {
        let a = MetricsRecord::new(scores(), "x.png", "y.png", &AnalysisConfig::default());
        let b = MetricsRecord::new(scores(), "x.png", "y.png", &AnalysisConfig::default());
        assert_eq!(to_metrics_json(&a).unwrap(), to_metrics_json(&b).unwrap());
    }

    #[test]
    fn parses_back() {
        let record = MetricsRecord::new(scores(), "x.png", "y.png", &AnalysisConfig::default());
        let json = to_metrics_json(&record).unwrap();
        let back: MetricsRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
