//! Shared types for the skinlight image analysis pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference masks and
/// single-channel intermediates without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference the decoded
/// photograph and the rendered visualization without depending on
/// `image` directly.
pub use image::RgbImage;

/// Mask value for a pixel classified as skin.
pub const SKIN: u8 = 255;

/// Mask value for a pixel classified as not-skin.
pub const NOT_SKIN: u8 = 0;

/// A rectangular sub-region of an image, in pixels.
///
/// Always lies within the image it was produced for:
/// `x + width <= image width` and `y + height <= image height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge (pixels from the left of the image).
    pub x: u32,
    /// Top edge (pixels from the top of the image).
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// Create a new bounding box without bounds checking.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The box covering an entire image of the given size.
    #[must_use]
    pub const fn full(dimensions: Dimensions) -> Self {
        Self::new(0, 0, dimensions.width, dimensions.height)
    }

    /// Clamp a possibly out-of-range rectangle (as reported by a face
    /// detector, which may use signed coordinates) to the image bounds.
    ///
    /// Returns `None` when nothing of the rectangle overlaps the image.
    #[must_use]
    pub fn clamped(x: i64, y: i64, width: i64, height: i64, dimensions: Dimensions) -> Option<Self> {
        let image_w = i64::from(dimensions.width);
        let image_h = i64::from(dimensions.height);

        let left = x.clamp(0, image_w);
        let top = y.clamp(0, image_h);
        let right = x.saturating_add(width).clamp(0, image_w);
        let bottom = y.saturating_add(height).clamp(0, image_h);

        if right <= left || bottom <= top {
            return None;
        }

        Some(Self::new(
            u32::try_from(left).ok()?,
            u32::try_from(top).ok()?,
            u32::try_from(right - left).ok()?,
            u32::try_from(bottom - top).ok()?,
        ))
    }

    /// Area in pixels.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether the box lies entirely inside an image of the given size.
    #[must_use]
    pub const fn fits_within(&self, dimensions: Dimensions) -> bool {
        self.x as u64 + self.width as u64 <= dimensions.width as u64
            && self.y as u64 + self.height as u64 <= dimensions.height as u64
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an existing image.
    #[must_use]
    pub fn of<P: image::Pixel>(image: &image::ImageBuffer<P, Vec<P::Subpixel>>) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total pixel count.
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// The three skin-condition indices, each in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexScores {
    /// Relative excess of red over green across the sampled skin.
    pub redness: f64,
    /// Local texture variability (spots, pores, blemish edges).
    pub blemish: f64,
    /// Brightness uniformity; 1.0 means perfectly even tone.
    pub tone_uniformity: f64,
}

impl IndexScores {
    /// Scores rounded to three decimal places, the form used at the
    /// serialization boundary.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            redness: round3(self.redness),
            blemish: round3(self.blemish),
            tone_uniformity: round3(self.tone_uniformity),
        }
    }
}

/// Round to three decimals from the exact binary value, so `0.0055`
/// (stored just below the tie) becomes `0.005`.
fn round3(value: f64) -> f64 {
    format!("{value:.3}").parse().unwrap_or(value)
}

/// Qualitative band of a score, used by the visual summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    /// `score < 0.3`
    Low,
    /// `0.3 <= score < 0.6`
    Moderate,
    /// `score >= 0.6`
    High,
}

impl Band {
    /// Lower bound (inclusive) of [`Band::High`].
    pub const HIGH_THRESHOLD: f64 = 0.6;
    /// Lower bound (inclusive) of [`Band::Moderate`].
    pub const MODERATE_THRESHOLD: f64 = 0.3;

    /// Classify a score.
    #[must_use]
    pub fn classify(score: f64) -> Self {
        if score >= Self::HIGH_THRESHOLD {
            Self::High
        } else if score >= Self::MODERATE_THRESHOLD {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

/// Configuration for the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Restrict analysis to the located face region. When `false` the
    /// whole image is analysed.
    pub auto_face: bool,

    /// Equalize local brightness before segmentation.
    pub light_comp: bool,
}

impl AnalysisConfig {
    /// Default for [`AnalysisConfig::auto_face`].
    pub const DEFAULT_AUTO_FACE: bool = true;
    /// Default for [`AnalysisConfig::light_comp`].
    pub const DEFAULT_LIGHT_COMP: bool = false;
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            auto_face: Self::DEFAULT_AUTO_FACE,
            light_comp: Self::DEFAULT_LIGHT_COMP,
        }
    }
}

/// How the analysed region was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionSource {
    /// Face location was disabled; the whole image is the region.
    WholeImage,
    /// A detector candidate was selected.
    Detected,
    /// No candidate was found; the centred fallback box was used.
    Fallback,
}

/// Result of running the full analysis pipeline.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The three indices (unrounded).
    pub scores: IndexScores,
    /// Heatmap overlay plus gauge panel.
    pub visualization: RgbImage,
    /// Region of the source image that was analysed.
    pub region: BoundingBox,
    /// How [`Analysis::region`] was chosen.
    pub region_source: RegionSource,
    /// Number of skin pixels in the cleaned mask.
    pub skin_pixels: u64,
    /// `true` when the mask was too small and the whole region was
    /// sampled instead.
    pub sample_fallback: bool,
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The image (or the region cropped from it) has no pixels.
    #[error("image region is empty ({width}x{height})")]
    EmptyRegion {
        /// Region width.
        width: u32,
        /// Region height.
        height: u32,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DIMS: Dimensions = Dimensions {
        width: 100,
        height: 50,
    };

    #[test]
    fn clamped_inside_is_unchanged() {
        let b = BoundingBox::clamped(10, 5, 20, 30, DIMS).unwrap();
        assert_eq!(b, BoundingBox::new(10, 5, 20, 30));
    }

    #[test]
    fn clamped_trims_overhang() {
        let b = BoundingBox::clamped(-10, 40, 30, 30, DIMS).unwrap();
        assert_eq!(b, BoundingBox::new(0, 40, 20, 10));
        assert!(b.fits_within(DIMS));
    }

    #[test]
    fn clamped_outside_is_none() {
        assert!(BoundingBox::clamped(200, 0, 10, 10, DIMS).is_none());
        assert!(BoundingBox::clamped(0, 0, 0, 10, DIMS).is_none());
    }

    #[test]
    fn area_does_not_overflow() {
        let b = BoundingBox::new(0, 0, u32::MAX, u32::MAX);
        assert_eq!(b.area(), u64::from(u32::MAX) * u64::from(u32::MAX));
    }

    #[test]
    fn band_thresholds_are_inclusive_lower_bounds() {
        assert_eq!(Band::classify(0.6), Band::High);
        assert_eq!(Band::classify(0.599_999), Band::Moderate);
        assert_eq!(Band::classify(0.3), Band::Moderate);
        assert_eq!(Band::classify(0.299_999), Band::Low);
        assert_eq!(Band::classify(0.0), Band::Low);
        assert_eq!(Band::classify(1.0), Band::High);
    }

    #[test]
    fn rounded_keeps_three_decimals() {
        let s = IndexScores {
            redness: 0.196_078_431,
            blemish: 0.000_4,
            tone_uniformity: 0.999_6,
        }
        .rounded();
        assert!((s.redness - 0.196).abs() < 1e-12);
        assert!(s.blemish.abs() < 1e-12);
        assert!((s.tone_uniformity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rounding_follows_the_stored_decimal_value() {
        for (value, expected) in [
            (0.0055, 0.005),
            (0.1235, 0.123),
            (0.2675, 0.268),
            (0.9995, 1.0),
            (1.0005, 1.0),
        ] {
            let got = round3(value);
            assert!((got - expected).abs() < 1e-12, "{value} -> {got}");
        }
    }

    #[test]
    fn analysis_config_defaults() {
        let config = AnalysisConfig::default();
        assert!(config.auto_face);
        assert!(!config.light_comp);
    }

    #[test]
    fn analysis_config_missing_fields_use_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"light_comp": true}"#).unwrap();
        assert!(config.auto_face);
        assert!(config.light_comp);
    }

    #[test]
    fn error_display() {
        assert_eq!(
            PipelineError::EmptyInput.to_string(),
            "input image data is empty"
        );
        assert_eq!(
            PipelineError::EmptyRegion {
                width: 0,
                height: 3
            }
            .to_string(),
            "image region is empty (0x3)",
        );
    }
}
