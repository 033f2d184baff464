//! Pipeline diagnostics: timing and per-stage metrics.
//!
//! [`analyze_with_diagnostics`] drives the staged [`Pipeline`] and
//! records how long each stage took alongside what it produced (region
//! choice, skin coverage, scores). The report is meant for tuning the
//! empirical thresholds and spotting slow stages on large photos.
//!
//! Timestamps come from the `web-time` crate, which uses
//! `performance.now()` on WASM and `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::face::FaceDetector;
use crate::pipeline::{Pipeline, PipelineStage};
use crate::types::{Analysis, AnalysisConfig, BoundingBox, IndexScores, PipelineError, RegionSource};

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

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: image decoding.
    pub decode: StageDiagnostics,
    /// Stage 2: face location and crop.
    pub locate: StageDiagnostics,
    /// Stage 3: brightness equalization (only when `light_comp` is set).
    pub normalize: Option<StageDiagnostics>,
    /// Stage 4: skin segmentation.
    pub segment: StageDiagnostics,
    /// Stage 5: index computation.
    pub score: StageDiagnostics,
    /// Stage 6: heatmap and panel rendering.
    pub visualize: StageDiagnostics,
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
        /// Size of the input image bytes (0 when started from pixels).
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// Region selection metrics.
    Locate {
        /// How the region was chosen.
        source: RegionSource,
        /// The chosen region.
        region: BoundingBox,
        /// Fraction of the image covered by the region.
        coverage: f64,
    },
    /// Brightness equalization parameters.
    Normalize {
        /// Tiles per axis.
        tile_grid: u32,
        /// Histogram clip limit.
        clip_limit: f32,
    },
    /// Skin segmentation metrics.
    Segment {
        /// Pixels classified as skin after cleanup.
        skin_pixel_count: u64,
        /// Pixels in the region.
        total_pixel_count: u64,
    },
    /// Index computation metrics.
    Score {
        /// Unrounded scores.
        scores: IndexScores,
        /// Whether the whole region was sampled instead of the mask.
        sample_fallback: bool,
    },
    /// Rendering metrics.
    Visualize {
        /// Output width in pixels.
        width: u32,
        /// Output height in pixels, including the panel.
        height: u32,
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
    /// How the analysed region was chosen.
    pub region_source: RegionSource,
    /// Skin pixels in the cleaned mask.
    pub skin_pixel_count: u64,
    /// Whether the whole region was sampled instead of the mask.
    pub sample_fallback: bool,
}

/// Run the full pipeline on encoded bytes, timing every stage.
///
/// # Errors
///
/// Returns the same errors as [`crate::analyze_bytes`].
pub fn analyze_with_diagnostics(
    image_bytes: Vec<u8>,
    config: &AnalysisConfig,
    detector: Option<&dyn FaceDetector>,
) -> Result<(Analysis, PipelineDiagnostics), PipelineError> {
    let run_start = Instant::now();

    let (decoded, decode) = timed(|| Pipeline::new(image_bytes, *config).decode())?;
    let (located, locate) = timed(|| decoded.locate(detector))?;

    let normalize_start = Instant::now();
    let normalized = located.normalize();
    let normalize = normalized.applied().then(|| StageDiagnostics {
        duration: normalize_start.elapsed(),
        metrics: normalized.metrics(),
    });

    let (segmented, segment) = timed(|| Ok(normalized.segment()))?;
    let (scored, score) = timed(|| Ok(segmented.score()))?;
    let (visualized, visualize) = timed(|| Ok(scored.visualize()))?;

    let image = visualized.image_dimensions();
    let analysis = visualized.into_result();
    let total_duration = run_start.elapsed();

    let summary = PipelineSummary {
        image_width: image.width,
        image_height: image.height,
        pixel_count: image.pixel_count(),
        region_source: analysis.region_source,
        skin_pixel_count: analysis.skin_pixels,
        sample_fallback: analysis.sample_fallback,
    };

    Ok((
        analysis,
        PipelineDiagnostics {
            decode,
            locate,
            normalize,
            segment,
            score,
            visualize,
            total_duration,
            summary,
        },
    ))
}

/// Run one stage transition and capture its duration and metrics.
fn timed<S: PipelineStage>(
    advance: impl FnOnce() -> Result<S, PipelineError>,
) -> Result<(S, StageDiagnostics), PipelineError> {
    let start = Instant::now();
    let stage = advance()?;
    let duration = start.elapsed();
    let metrics = stage.metrics();
    Ok((stage, StageDiagnostics { duration, metrics }))
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
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

        let mut stages: Vec<(&str, &StageDiagnostics)> =
            vec![("Decode", &self.decode), ("Locate", &self.locate)];
        if let Some(ref n) = self.normalize {
            stages.push(("Normalize", n));
        }
        stages.push(("Segment", &self.segment));
        stages.push(("Score", &self.score));
        stages.push(("Visualize", &self.visualize));

        for (name, diag) in &stages {
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
            "Region: {:?}  |  Skin pixels: {}{}",
            self.summary.region_source,
            self.summary.skin_pixel_count,
            if self.summary.sample_fallback {
                " (below threshold, whole region sampled)"
            } else {
                ""
            },
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
            input_bytes,
            width,
            height,
            ..
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Locate {
            source,
            region,
            coverage,
        } => format!(
            "{source:?} {}x{} at ({}, {}) ({:.1}% of image)",
            region.width,
            region.height,
            region.x,
            region.y,
            coverage * 100.0,
        ),
        StageMetrics::Normalize {
            tile_grid,
            clip_limit,
        } => format!("grid={tile_grid}x{tile_grid} clip={clip_limit:.1}"),
        StageMetrics::Segment {
            skin_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *skin_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!("skin={skin_pixel_count} ({density:.1}%)")
        }
        StageMetrics::Score {
            scores,
            sample_fallback,
        } => format!(
            "redness={:.3} blemish={:.3} tone={:.3}{}",
            scores.redness,
            scores.blemish,
            scores.tone_uniformity,
            if *sample_fallback { " [fallback]" } else { "" },
        ),
        StageMetrics::Visualize { width, height } => format!("{width}x{height}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn uniform_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 150, 120]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        assert!((duration_ms(d) - 1234.0).abs() < 0.01);
    }

    #[test]
    fn normalize_stage_only_recorded_when_enabled() {
        let png = uniform_png(40, 40);
        let (_, off) = analyze_with_diagnostics(png.clone(), &AnalysisConfig::default(), None).unwrap();
        assert!(off.normalize.is_none());

        let config = AnalysisConfig {
            light_comp: true,
            ..AnalysisConfig::default()
        };
        let (_, on) = analyze_with_diagnostics(png, &config, None).unwrap();
        assert!(on.normalize.is_some());
    }

    #[test]
    fn diagnostics_match_analysis() {
        let png = uniform_png(50, 30);
        let len = png.len();
        let (analysis, diag) =
            analyze_with_diagnostics(png, &AnalysisConfig::default(), None).unwrap();

        assert_eq!(diag.summary.image_width, 50);
        assert_eq!(diag.summary.image_height, 30);
        assert_eq!(diag.summary.region_source, RegionSource::Fallback);
        assert_eq!(diag.summary.skin_pixel_count, analysis.skin_pixels);
        assert_eq!(
            diag.decode.metrics,
            StageMetrics::Decode {
                input_bytes: len,
                width: 50,
                height: 30,
                pixel_count: 1500,
            }
        );
        assert_eq!(
            diag.score.metrics,
            StageMetrics::Score {
                scores: analysis.scores,
                sample_fallback: analysis.sample_fallback,
            }
        );
        assert!(diag.total_duration >= diag.segment.duration);
    }

    #[test]
    fn decode_errors_propagate() {
        let result = analyze_with_diagnostics(Vec::new(), &AnalysisConfig::default(), None);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn report_lists_every_stage() {
        let config = AnalysisConfig {
            light_comp: true,
            ..AnalysisConfig::default()
        };
        let (_, diag) = analyze_with_diagnostics(uniform_png(30, 30), &config, None).unwrap();
        let report = diag.report();
        assert!(report.contains("Pipeline Diagnostics Report"));
        for stage in ["Decode", "Locate", "Normalize", "Segment", "Score", "Visualize"] {
            assert!(report.contains(stage), "missing {stage} in:\n{report}");
        }
    }

    #[test]
    fn serializes_durations_as_seconds() {
        let diag = StageDiagnostics {
            duration: Duration::from_millis(1500),
            metrics: StageMetrics::Visualize {
                width: 10,
                height: 90,
            },
        };
        let json = serde_json::to_value(&diag).unwrap();
        assert!((json["duration"].as_f64().unwrap() - 1.5).abs() < 1e-12);

        let back: StageDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.duration, Duration::from_millis(1500));
    }
}
