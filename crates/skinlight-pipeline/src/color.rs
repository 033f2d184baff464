//! Per-pixel colour-space conversions on 8-bit RGB data.
//!
//! All conversions follow the common 8-bit conventions used by skin
//! segmentation literature:
//!
//! - Luma uses the BT.601 weights `0.299 R + 0.587 G + 0.114 B`.
//! - Y/Cr/Cb uses `Cr = (R - Y) * 0.713 + 128` and
//!   `Cb = (B - Y) * 0.564 + 128`.
//! - HSV stores hue as degrees / 2 so that it fits in a byte (`0..180`),
//!   saturation and value in `0..=255`.
//!
//! Results are rounded to the nearest integer and saturated to `0..=255`.

use image::{GrayImage, Luma, Rgb, RgbImage};

const KR: f32 = 0.299;
const KG: f32 = 0.587;
const KB: f32 = 0.114;
const CR_SCALE: f32 = 0.713;
const CB_SCALE: f32 = 0.564;
const CHROMA_OFFSET: f32 = 128.0;

/// Round and saturate a float to a byte.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn saturate_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn luma_f32(r: u8, g: u8, b: u8) -> f32 {
    KB.mul_add(f32::from(b), KR.mul_add(f32::from(r), KG * f32::from(g)))
}

/// BT.601 luma of a single pixel.
#[must_use]
pub fn luma(pixel: Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    saturate_u8(luma_f32(r, g, b))
}

/// Convert an RGB pixel to `[Y, Cr, Cb]`.
#[must_use]
pub fn rgb_to_ycrcb(pixel: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0;
    let y = luma_f32(r, g, b);
    let cr = (f32::from(r) - y).mul_add(CR_SCALE, CHROMA_OFFSET);
    let cb = (f32::from(b) - y).mul_add(CB_SCALE, CHROMA_OFFSET);
    [saturate_u8(y), saturate_u8(cr), saturate_u8(cb)]
}

/// Convert `[Y, Cr, Cb]` back to an RGB pixel.
#[must_use]
pub fn ycrcb_to_rgb(ycrcb: [u8; 3]) -> Rgb<u8> {
    let y = f32::from(ycrcb[0]);
    let cr = f32::from(ycrcb[1]) - CHROMA_OFFSET;
    let cb = f32::from(ycrcb[2]) - CHROMA_OFFSET;
    let r = 1.403_f32.mul_add(cr, y);
    let g = (-0.344_f32).mul_add(cb, (-0.714_f32).mul_add(cr, y));
    let b = 1.773_f32.mul_add(cb, y);
    Rgb([saturate_u8(r), saturate_u8(g), saturate_u8(b)])
}

/// Convert an RGB pixel to `[H, S, V]` with hue in half-degrees.
#[must_use]
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0;
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = f32::from(v - min);

    let s = if v == 0 {
        0.0
    } else {
        delta * 255.0 / f32::from(v)
    };

    let h = if v == min {
        0.0
    } else {
        let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
        let degrees = if v == pixel.0[0] {
            60.0 * (g - b) / delta
        } else if v == pixel.0[1] {
            60.0_f32.mul_add((b - r) / delta, 120.0)
        } else {
            60.0_f32.mul_add((r - g) / delta, 240.0)
        };
        if degrees < 0.0 {
            degrees + 360.0
        } else {
            degrees
        }
    };

    // 360 degrees wraps back to hue 0.
    let half = saturate_u8(h / 2.0);
    let half = if half >= 180 { 0 } else { half };
    [half, saturate_u8(s), v]
}

/// BT.601 grayscale version of an RGB image.
#[must_use = "returns the grayscale image"]
pub fn to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([luma(*image.get_pixel(x, y))])
    })
}

/// Map an out-of-range coordinate back into `0..len` by mirroring
/// about the edge pixels without repeating them (`gfedcb|abcdefgh|gfedcba`).
#[must_use]
pub(crate) fn reflect_101(index: i64, len: u32) -> u32 {
    let len = i64::from(len);
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let mut i = index.rem_euclid(period);
    if i >= len {
        i = period - i;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        i as u32
    }
}
