//! Skin segmentation.
//!
//! The region is smoothed with an edge-preserving bilateral filter, then
//! classified independently in HSV and Y/Cr/Cb. A pixel is skin only if
//! both colour rules accept it. The combined mask is cleaned with two
//! rounds of morphological opening followed by two rounds of closing
//! using a 5×5 elliptical structuring element.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::morphology::{Mask as StructuringElement, grayscale_dilate, grayscale_erode};
use tracing::debug;

use crate::color::{reflect_101, rgb_to_hsv, rgb_to_ycrcb, saturate_u8};
use crate::types::{NOT_SKIN, SKIN};

/// Diameter of the bilateral filter neighbourhood.
pub const BILATERAL_DIAMETER: u32 = 7;

/// Bilateral filter range (colour) sigma.
pub const SIGMA_COLOR: f32 = 50.0;

/// Bilateral filter spatial sigma.
pub const SIGMA_SPACE: f32 = 50.0;

/// Number of erode/dilate repetitions in each morphology operation.
pub const MORPH_ITERATIONS: usize = 2;

/// Inclusive `[H, S, V]` lower bound for skin (hue in half-degrees).
pub const HSV_LOWER: [u8; 3] = [0, 30, 30];

/// Inclusive `[H, S, V]` upper bound for skin.
pub const HSV_UPPER: [u8; 3] = [25, 180, 255];

/// Inclusive `[Y, Cr, Cb]` lower bound for skin.
pub const YCRCB_LOWER: [u8; 3] = [0, 135, 85];

/// Inclusive `[Y, Cr, Cb]` upper bound for skin.
pub const YCRCB_UPPER: [u8; 3] = [255, 180, 135];

/// 5×5 ellipse footprint (row-major).
const ELLIPSE_5X5: [[bool; 5]; 5] = [
    [false, false, true, false, false],
    [true, true, true, true, true],
    [true, true, true, true, true],
    [true, true, true, true, true],
    [false, false, true, false, false],
];

/// Classify every pixel of a region as skin or not-skin.
///
/// Returns a mask of the same dimensions holding [`SKIN`] or
/// [`NOT_SKIN`]. There is no minimum-size guarantee on the result.
#[must_use = "returns the skin mask"]
pub fn segment_skin(region: &RgbImage) -> GrayImage {
    let smoothed = bilateral_filter(region, BILATERAL_DIAMETER, SIGMA_COLOR, SIGMA_SPACE);
    let combined = combine(&hsv_mask(&smoothed), &ycrcb_mask(&smoothed));
    let element = ellipse_element();
    let cleaned = close(&open(&combined, &element), &element);

    debug!(
        raw = count_skin(&combined),
        cleaned = count_skin(&cleaned),
        "skin segmentation finished",
    );
    cleaned
}

/// Edge-preserving smoothing.
///
/// Each output pixel is the average of its circular neighbourhood
/// weighted by `exp(-r² / 2σs²)` spatially and `exp(-d² / 2σc²)` in
/// colour, where `d` is the sum of absolute channel differences. Pixels
/// outside the image are taken by reflection.
#[must_use = "returns the filtered image"]
pub fn bilateral_filter(
    image: &RgbImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let radius = i64::from(diameter / 2);
    let space_coeff = -0.5 / (sigma_space * sigma_space);
    let color_coeff = -0.5 / (sigma_color * sigma_color);

    // Spatial weights for the circular window.
    let mut window = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = dx * dx + dy * dy;
            if r2 > radius * radius {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let weight = (r2 as f32 * space_coeff).exp();
            window.push((dx, dy, weight));
        }
    }

    // Colour weights by L1 distance (0..=765).
    let color_weights: Vec<f32> = (0..=3 * 255)
        .map(|d: u16| {
            let d = f32::from(d);
            (d * d * color_coeff).exp()
        })
        .collect();

    RgbImage::from_fn(width, height, |x, y| {
        let centre = image.get_pixel(x, y).0;
        let mut sum = [0.0f32; 3];
        let mut norm = 0.0f32;

        for &(dx, dy, space_weight) in &window {
            let nx = reflect_101(i64::from(x) + dx, width);
            let ny = reflect_101(i64::from(y) + dy, height);
            let neighbour = image.get_pixel(nx, ny).0;
            let distance: u16 = centre
                .iter()
                .zip(neighbour.iter())
                .map(|(&a, &b)| u16::from(a.abs_diff(b)))
                .sum();
            let weight = space_weight * color_weights[usize::from(distance)];
            for (acc, &channel) in sum.iter_mut().zip(neighbour.iter()) {
                *acc = weight.mul_add(f32::from(channel), *acc);
            }
            norm += weight;
        }

        Rgb(sum.map(|s| saturate_u8(s / norm)))
    })
}

fn in_range(value: [u8; 3], lower: [u8; 3], upper: [u8; 3]) -> bool {
    (0..3).all(|c| lower[c] <= value[c] && value[c] <= upper[c])
}

fn threshold(image: &RgbImage, classify: impl Fn(Rgb<u8>) -> bool) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([if classify(*image.get_pixel(x, y)) {
            SKIN
        } else {
            NOT_SKIN
        }])
    })
}

/// Pixels whose HSV value lies within [`HSV_LOWER`]..=[`HSV_UPPER`].
#[must_use]
pub fn hsv_mask(image: &RgbImage) -> GrayImage {
    threshold(image, |p| in_range(rgb_to_hsv(p), HSV_LOWER, HSV_UPPER))
}

/// Pixels whose Y/Cr/Cb value lies within
/// [`YCRCB_LOWER`]..=[`YCRCB_UPPER`].
#[must_use]
pub fn ycrcb_mask(image: &RgbImage) -> GrayImage {
    threshold(image, |p| in_range(rgb_to_ycrcb(p), YCRCB_LOWER, YCRCB_UPPER))
}

/// Logical AND of two masks of equal size.
#[must_use]
pub fn combine(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        let both = a.get_pixel(x, y).0[0] == SKIN && b.get_pixel(x, y).0[0] == SKIN;
        Luma([if both { SKIN } else { NOT_SKIN }])
    })
}

/// The 5×5 elliptical structuring element, centred at (2, 2).
#[must_use]
pub fn ellipse_element() -> StructuringElement {
    let footprint = GrayImage::from_fn(5, 5, |x, y| {
        Luma([if ELLIPSE_5X5[y as usize][x as usize] {
            255
        } else {
            0
        }])
    });
    StructuringElement::from_image(&footprint, 2, 2)
}

/// [`MORPH_ITERATIONS`] erosions followed by as many dilations.
#[must_use]
pub fn open(mask: &GrayImage, element: &StructuringElement) -> GrayImage {
    let mut out = mask.clone();
    for _ in 0..MORPH_ITERATIONS {
        out = grayscale_erode(&out, element);
    }
    for _ in 0..MORPH_ITERATIONS {
        out = grayscale_dilate(&out, element);
    }
    out
}

/// [`MORPH_ITERATIONS`] dilations followed by as many erosions.
#[must_use]
pub fn close(mask: &GrayImage, element: &StructuringElement) -> GrayImage {
    let mut out = mask.clone();
    for _ in 0..MORPH_ITERATIONS {
        out = grayscale_dilate(&out, element);
    }
    for _ in 0..MORPH_ITERATIONS {
        out = grayscale_erode(&out, element);
    }
    out
}

/// Number of [`SKIN`] pixels in a mask.
#[must_use]
pub fn count_skin(mask: &GrayImage) -> u64 {
    mask.pixels().filter(|p| p.0[0] == SKIN).map(|_| 1u64).sum()
}
