//! Skin-condition indices.
//!
//! Three independent scores are computed over a sample population of
//! pixels: the skin pixels of the mask, or the entire region when the
//! mask holds fewer than [`MIN_SKIN_PIXELS`] skin pixels.
//!
//! - **Redness**: mean of `max(R - G, 0)` divided by 255.
//! - **Blemish**: standard deviation of the 3×3 Laplacian response of
//!   the grayscale region, divided by [`BLEMISH_SCALE`].
//! - **Tone uniformity**: `1 - std(luma) / TONE_SCALE`.
//!
//! Every score is clamped to `[0, 1]`. No rounding happens here.

use image::{GrayImage, Luma, RgbImage};
use tracing::debug;

use crate::color::{luma, reflect_101};
use crate::types::{IndexScores, SKIN};

/// Below this many skin pixels the mask is not trusted and the whole
/// region is sampled instead.
pub const MIN_SKIN_PIXELS: u64 = 50;

/// Laplacian standard deviation that maps to a blemish score of 1.
pub const BLEMISH_SCALE: f64 = 40.0;

/// Luma standard deviation that maps to a tone-uniformity score of 0.
pub const TONE_SCALE: f64 = 64.0;

/// 3×3 aperture Laplacian, `[[2, 0, 2], [0, -8, 0], [2, 0, 2]]`.
const LAPLACIAN: [[i16; 3]; 3] = [[2, 0, 2], [0, -8, 0], [2, 0, 2]];

/// Scores plus the intermediates the visualizer needs.
#[derive(Debug, Clone)]
pub struct IndexOutput {
    /// The three unrounded scores.
    pub scores: IndexScores,
    /// Per-pixel `max(R - G, 0)` over the whole region.
    pub redness_map: GrayImage,
    /// Skin pixels in the mask as given.
    pub skin_pixels: u64,
    /// `true` when the whole region was sampled because the mask was
    /// too small.
    pub sample_fallback: bool,
}

/// Compute the three indices for a region and its skin mask.
///
/// `mask` must have the same dimensions as `region`. An empty region
/// yields zero redness, zero blemish and full uniformity.
#[must_use]
pub fn compute_indices(region: &RgbImage, mask: &GrayImage) -> IndexOutput {
    let skin_pixels = mask.pixels().filter(|p| p.0[0] == SKIN).map(|_| 1u64).sum();
    let sample_fallback = skin_pixels < MIN_SKIN_PIXELS;
    if sample_fallback {
        debug!(
            skin_pixels,
            min = MIN_SKIN_PIXELS,
            "skin mask too small, sampling the whole region",
        );
    }
    let in_sample = |x: u32, y: u32| sample_fallback || mask.get_pixel(x, y).0[0] == SKIN;

    let redness_map = redness_map(region);
    let gray = crate::color::to_gray(region);
    let response = laplacian(&gray);

    let mut redness = Stats::default();
    let mut texture = Stats::default();
    let mut tone = Stats::default();
    for (x, y, pixel) in region.enumerate_pixels() {
        if !in_sample(x, y) {
            continue;
        }
        redness.push(f64::from(redness_map.get_pixel(x, y).0[0]));
        texture.push(f64::from(response[y as usize * region.width() as usize + x as usize]));
        tone.push(f64::from(luma(*pixel)));
    }

    let scores = IndexScores {
        redness: (redness.mean() / 255.0).clamp(0.0, 1.0),
        blemish: (texture.std_dev() / BLEMISH_SCALE).clamp(0.0, 1.0),
        tone_uniformity: 1.0 - (tone.std_dev() / TONE_SCALE).clamp(0.0, 1.0),
    };

    IndexOutput {
        scores,
        redness_map,
        skin_pixels,
        sample_fallback,
    }
}

/// Per-pixel red excess `max(R - G, 0)`.
#[must_use]
pub fn redness_map(region: &RgbImage) -> GrayImage {
    GrayImage::from_fn(region.width(), region.height(), |x, y| {
        let [r, g, _] = region.get_pixel(x, y).0;
        Luma([r.saturating_sub(g)])
    })
}

/// 3×3 Laplacian response of a grayscale image, row-major, borders
/// reflected without repeating the edge pixel.
#[must_use]
pub fn laplacian(gray: &GrayImage) -> Vec<f32> {
    let (width, height) = gray.dimensions();
    let mut out = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0i16;
            for (ky, row) in LAPLACIAN.iter().enumerate() {
                for (kx, &k) in row.iter().enumerate() {
                    if k == 0 {
                        continue;
                    }
                    #[allow(clippy::cast_possible_wrap)]
                    let sx = reflect_101(i64::from(x) + kx as i64 - 1, width);
                    #[allow(clippy::cast_possible_wrap)]
                    let sy = reflect_101(i64::from(y) + ky as i64 - 1, height);
                    acc += k * i16::from(gray.get_pixel(sx, sy).0[0]);
                }
            }
            out.push(f32::from(acc));
        }
    }
    out
}

/// Streaming population mean and standard deviation (Welford).
#[derive(Debug, Default, Clone, Copy)]
struct Stats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl Stats {
    fn push(&mut self, value: f64) {
        self.count += 1;
        #[allow(clippy::cast_precision_loss)]
        let n = self.count as f64;
        let delta = value - self.mean;
        self.mean += delta / n;
        self.m2 = delta.mul_add(value - self.mean, self.m2);
    }

    const fn mean(&self) -> f64 {
        self.mean
    }

    fn std_dev(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.count as f64;
        (self.m2 / n).max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;
    use crate::types::NOT_SKIN;

    fn full_mask(w: u32, h: u32) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([SKIN]))
    }

    fn textured(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let v = ((x * 37 + y * 91) % 120) as u8;
            Rgb([120 + v, 80 + v / 2, 60])
        })
    }

    #[test]
    fn uniform_skin_tone_scores() {
        let region = RgbImage::from_pixel(20, 20, Rgb([200, 150, 120]));
        let out = compute_indices(&region, &full_mask(20, 20));
        assert!((out.scores.redness - 50.0 / 255.0).abs() < 1e-9);
        assert!(out.scores.blemish.abs() < 1e-9);
        assert!((out.scores.tone_uniformity - 1.0).abs() < 1e-9);
        assert_eq!(out.skin_pixels, 400);
        assert!(!out.sample_fallback);
    }

    #[test]
    fn redness_clamps_negative_differences() {
        let region = RgbImage::from_pixel(10, 10, Rgb([50, 200, 50]));
        let out = compute_indices(&region, &full_mask(10, 10));
        assert!(out.scores.redness.abs() < 1e-12);
        assert_eq!(out.redness_map.get_pixel(3, 3).0[0], 0);
    }

    #[test]
    fn small_mask_falls_back_to_whole_region() {
        let region = textured(30, 20);
        let mut sparse = GrayImage::from_pixel(30, 20, Luma([NOT_SKIN]));
        for x in 0..10 {
            sparse.put_pixel(x, 3, Luma([SKIN]));
        }

        let fallback = compute_indices(&region, &sparse);
        let whole = compute_indices(&region, &full_mask(30, 20));

        assert!(fallback.sample_fallback);
        assert_eq!(fallback.skin_pixels, 10);
        assert_eq!(fallback.scores, whole.scores);
    }

    #[test]
    fn empty_mask_falls_back_to_whole_region() {
        let region = textured(16, 16);
        let empty = GrayImage::from_pixel(16, 16, Luma([NOT_SKIN]));
        let out = compute_indices(&region, &empty);
        assert!(out.sample_fallback);
        assert_eq!(out.scores, compute_indices(&region, &full_mask(16, 16)).scores);
    }

    #[test]
    fn mask_at_threshold_is_trusted() {
        // Exactly 50 skin pixels, all on a flat patch: only those count.
        let mut region = textured(40, 40);
        let mut mask = GrayImage::from_pixel(40, 40, Luma([NOT_SKIN]));
        for y in 10..15 {
            for x in 10..20 {
                region.put_pixel(x, y, Rgb([180, 130, 110]));
                mask.put_pixel(x, y, Luma([SKIN]));
            }
        }
        let out = compute_indices(&region, &mask);
        assert!(!out.sample_fallback);
        assert_eq!(out.skin_pixels, 50);
        assert!((out.scores.redness - 50.0 / 255.0).abs() < 1e-9);
        assert!((out.scores.tone_uniformity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn scores_stay_in_unit_range_on_extreme_texture() {
        let region = RgbImage::from_fn(24, 24, |x, y| {
            if x % 2 == 0 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let s = compute_indices(&region, &full_mask(24, 24)).scores;
        for v in [s.redness, s.blemish, s.tone_uniformity] {
            assert!((0.0..=1.0).contains(&v), "{s:?}");
        }
        assert!((s.blemish - 1.0).abs() < 1e-12);
    }

    #[test]
    fn uneven_brightness_lowers_tone_uniformity() {
        let region = RgbImage::from_fn(20, 20, |x, _| {
            if x < 10 {
                Rgb([220, 170, 140])
            } else {
                Rgb([120, 80, 60])
            }
        });
        let s = compute_indices(&region, &full_mask(20, 20)).scores;
        assert!(s.tone_uniformity < 0.5, "{s:?}");
    }

    #[test]
    fn laplacian_of_flat_image_is_zero() {
        let gray = GrayImage::from_pixel(5, 4, Luma([77]));
        assert!(laplacian(&gray).iter().all(|v| v.abs() < f32::EPSILON));
    }

    #[test]
    fn laplacian_of_single_bright_pixel() {
        let mut gray = GrayImage::from_pixel(5, 5, Luma([0]));
        gray.put_pixel(2, 2, Luma([10]));
        let response = laplacian(&gray);
        assert!((response[2 * 5 + 2] + 80.0).abs() < f32::EPSILON);
        assert!((response[5 + 1] - 20.0).abs() < f32::EPSILON);
        assert!(response[5 + 2].abs() < f32::EPSILON);
    }

    #[test]
    fn empty_region_does_not_divide_by_zero() {
        let out = compute_indices(&RgbImage::new(0, 0), &GrayImage::new(0, 0));
        assert!(out.sample_fallback);
        assert!(out.scores.redness.abs() < f64::EPSILON);
        assert!((out.scores.tone_uniformity - 1.0).abs() < f64::EPSILON);
    }
}
