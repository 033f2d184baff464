//! Face region localization.
//!
//! A pluggable [`FaceDetector`] reports candidate rectangles; the
//! locator keeps the one with the largest area. When the detector finds
//! nothing (or none is configured) the locator falls back to a fixed
//! centred box covering 80% of each axis. Absence of a face is a normal
//! outcome, never an error.

use image::{GrayImage, RgbImage};
use tracing::debug;

use crate::types::{BoundingBox, Dimensions, RegionSource};

/// Smallest face edge length (pixels) a detector is asked to report.
pub const MIN_FACE_SIZE: u32 = 80;

/// Margin on each side of the fallback box, as a fraction of the axis.
pub const FALLBACK_MARGIN: f64 = 0.1;

/// Extent of the fallback box, as a fraction of the axis.
pub const FALLBACK_EXTENT: f64 = 0.8;

/// A face rectangle reported by a detector, in possibly out-of-range
/// signed pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceCandidate {
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width.
    pub width: i64,
    /// Height.
    pub height: i64,
}

/// Pluggable frontal-face detection backend.
///
/// Implementations return candidates in their own enumeration order;
/// the locator relies on that order to break area ties.
pub trait FaceDetector {
    /// Detect faces in a grayscale image, ignoring faces smaller than
    /// `min_size` pixels on a side.
    fn detect(&self, gray: &GrayImage, min_size: u32) -> Vec<FaceCandidate>;
}

/// The deterministic centred box used when no face is found.
///
/// Offsets are `floor(0.1 * extent)` and sizes `floor(0.8 * extent)`.
#[must_use]
pub fn fallback_box(dimensions: Dimensions) -> BoundingBox {
    BoundingBox::new(
        scale_floor(dimensions.width, FALLBACK_MARGIN),
        scale_floor(dimensions.height, FALLBACK_MARGIN),
        scale_floor(dimensions.width, FALLBACK_EXTENT),
        scale_floor(dimensions.height, FALLBACK_EXTENT),
    )
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_floor(extent: u32, fraction: f64) -> u32 {
    (f64::from(extent) * fraction).floor() as u32
}

/// Pick the candidate with the largest area.
///
/// Candidates are clamped to the image first; ones that fall entirely
/// outside are dropped. Area is compared with a strict `>`, so among
/// equal-area candidates the first one enumerated wins.
#[must_use]
pub fn select_largest(candidates: &[FaceCandidate], dimensions: Dimensions) -> Option<BoundingBox> {
    let mut best: Option<BoundingBox> = None;
    for c in candidates {
        let Some(bbox) = BoundingBox::clamped(c.x, c.y, c.width, c.height, dimensions) else {
            continue;
        };
        if best.is_none_or(|b| bbox.area() > b.area()) {
            best = Some(bbox);
        }
    }
    best
}

/// Locate the primary face in an image.
///
/// Returns the chosen region and whether it came from the detector or
/// the fallback. Passing `None` for `detector` always yields the
/// fallback box.
#[must_use]
pub fn locate_face(
    image: &RgbImage,
    detector: Option<&dyn FaceDetector>,
) -> (BoundingBox, RegionSource) {
    let dimensions = Dimensions::of(image);

    let candidates = detector.map_or_else(Vec::new, |d| {
        let gray = crate::color::to_gray(image);
        d.detect(&gray, MIN_FACE_SIZE)
    });
    debug!(candidates = candidates.len(), "face detection finished");

    select_largest(&candidates, dimensions).map_or_else(
        || {
            let bbox = fallback_box(dimensions);
            debug!(?bbox, "no face found, using centred fallback region");
            (bbox, RegionSource::Fallback)
        },
        |bbox| (bbox, RegionSource::Detected),
    )
}

/// Copy a sub-region out of an image.
#[must_use = "returns the cropped region"]
pub fn crop(image: &RgbImage, bbox: BoundingBox) -> RgbImage {
    image::imageops::crop_imm(image, bbox.x, bbox.y, bbox.width, bbox.height).to_image()
}
