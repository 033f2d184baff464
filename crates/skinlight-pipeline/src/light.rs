//! Illumination normalization via contrast-limited adaptive histogram
//! equalization (CLAHE) on the luma channel.
//!
//! The image is converted to Y/Cr/Cb, the Y channel is equalized over an
//! 8×8 grid of tiles, and the result is converted back to RGB. Chroma
//! channels pass through untouched, so only local brightness contrast
//! changes and colour balance is preserved.
//!
//! Per-tile histograms are clipped at `clip_limit * tile_area / 256`
//! counts; the clipped excess is redistributed uniformly across all
//! bins. Each output pixel is a bilinear blend of the lookup tables of
//! the four nearest tile centres. Images whose size is not a multiple of
//! the grid are virtually extended by reflection when histograms are
//! gathered.

use image::{GrayImage, Luma, RgbImage};

use crate::color::{reflect_101, rgb_to_ycrcb, saturate_u8, ycrcb_to_rgb};

/// Number of tiles along each axis.
pub const TILE_GRID: u32 = 8;

/// Histogram clip limit, relative to a flat histogram.
pub const CLIP_LIMIT: f32 = 2.0;

const BINS: usize = 256;

/// Equalize local brightness of an RGB image.
///
/// Output has identical dimensions. Never fails; empty images are
/// returned unchanged.
#[must_use = "returns the brightness-normalized image"]
pub fn normalize_light(image: &RgbImage) -> RgbImage {
    if image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    let ycrcb: Vec<[u8; 3]> = image.pixels().map(|p| rgb_to_ycrcb(*p)).collect();
    let luma = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([ycrcb[pixel_index(image.width(), x, y)][0]])
    });

    let equalized = clahe(&luma, TILE_GRID, CLIP_LIMIT);

    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [_, cr, cb] = ycrcb[pixel_index(image.width(), x, y)];
        ycrcb_to_rgb([equalized.get_pixel(x, y).0[0], cr, cb])
    })
}

const fn pixel_index(width: u32, x: u32, y: u32) -> usize {
    y as usize * width as usize + x as usize
}

/// Contrast-limited adaptive histogram equalization of a grayscale image.
///
/// `grid` tiles per axis (at least 1) and `clip_limit` relative to a
/// uniform histogram; a non-positive clip limit disables clipping.
#[must_use = "returns the equalized image"]
pub fn clahe(image: &GrayImage, grid: u32, clip_limit: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let grid = grid.max(1);
    let tile_w = width.div_ceil(grid);
    let tile_h = height.div_ceil(grid);
    let tile_area = u64::from(tile_w) * u64::from(tile_h);

    let clip = if clip_limit > 0.0 {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let limit = (clip_limit * tile_area as f32 / BINS as f32) as u64;
        Some(limit.max(1))
    } else {
        None
    };

    let mut luts = Vec::with_capacity((grid * grid) as usize);
    for ty in 0..grid {
        for tx in 0..grid {
            let mut hist = tile_histogram(image, tx * tile_w, ty * tile_h, tile_w, tile_h);
            if let Some(limit) = clip {
                clip_histogram(&mut hist, limit);
            }
            luts.push(histogram_lut(&hist, tile_area));
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let (inv_tw, inv_th) = (1.0 / tile_w as f32, 1.0 / tile_h as f32);
    let last = i64::from(grid) - 1;

    GrayImage::from_fn(width, height, |x, y| {
        let (tx1, tx2, xa) = tile_neighbours(x, inv_tw, last);
        let (ty1, ty2, ya) = tile_neighbours(y, inv_th, last);
        let v = usize::from(image.get_pixel(x, y).0[0]);
        let at = |tx: usize, ty: usize| f32::from(luts[ty * grid as usize + tx][v]);

        let top = at(tx1, ty1).mul_add(1.0 - xa, at(tx2, ty1) * xa);
        let bottom = at(tx1, ty2).mul_add(1.0 - xa, at(tx2, ty2) * xa);
        Luma([saturate_u8(top.mul_add(1.0 - ya, bottom * ya))])
    })
}

/// Histogram of one tile, reading past the image edge by reflection.
fn tile_histogram(image: &GrayImage, x0: u32, y0: u32, tile_w: u32, tile_h: u32) -> [u64; BINS] {
    let mut hist = [0u64; BINS];
    for dy in 0..tile_h {
        let y = reflect_101(i64::from(y0) + i64::from(dy), image.height());
        for dx in 0..tile_w {
            let x = reflect_101(i64::from(x0) + i64::from(dx), image.width());
            hist[usize::from(image.get_pixel(x, y).0[0])] += 1;
        }
    }
    hist
}

/// Clip every bin at `limit` and spread the excess evenly over all
/// bins. The remainder goes one count at a time to bins spaced evenly
/// across the whole range, so a flat channel maps close to itself.
fn clip_histogram(hist: &mut [u64; BINS], limit: u64) {
    let mut excess = 0u64;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }

    let batch = excess / BINS as u64;
    let residual = excess - batch * BINS as u64;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    for k in 0..residual {
        #[allow(clippy::cast_possible_truncation)]
        let index = ((2 * k + 1) * BINS as u64 / (2 * residual)) as usize;
        hist[index] += 1;
    }
}

/// Cumulative-distribution lookup table for a (clipped) histogram.
fn histogram_lut(hist: &[u64; BINS], tile_area: u64) -> [u8; BINS] {
    #[allow(clippy::cast_precision_loss)]
    let scale = 255.0 / tile_area as f32;
    let mut lut = [0u8; BINS];
    let mut sum = 0u64;
    for (entry, &count) in lut.iter_mut().zip(hist.iter()) {
        sum += count;
        #[allow(clippy::cast_precision_loss)]
        let value = sum as f32 * scale;
        *entry = saturate_u8(value);
    }
    lut
}

/// The two tile indices bracketing a pixel coordinate and the blend
/// weight of the second one.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn tile_neighbours(coord: u32, inv_tile: f32, last: i64) -> (usize, usize, f32) {
    #[allow(clippy::cast_precision_loss)]
    let pos = (coord as f32).mul_add(inv_tile, -0.5);
    let floor = pos.floor();
    let weight = pos - floor;
    let first = floor as i64;
    let second = first + 1;
    (
        first.clamp(0, last) as usize,
        second.clamp(0, last) as usize,
        weight,
    )
}
