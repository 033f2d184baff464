//! Result rendering: redness heatmap overlay plus a gauge panel.
//!
//! The redness map is min-max stretched to `0..=255`, colourized with a
//! jet colormap, masked to skin pixels and blended onto the region as
//! `0.7 · region + 0.6 · heat`. The weights do not sum to one, so the
//! blend is slightly brighter than the source. Below the image an
//! [`PANEL_HEIGHT`]-pixel white panel holds one gauge per index and a
//! summary line naming the band of each score.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::color::saturate_u8;
use crate::font::{GLYPH_HEIGHT, draw_text};
use crate::types::{Band, IndexScores, SKIN};

/// Height of the gauge panel appended below the image.
pub const PANEL_HEIGHT: u32 = 80;

/// Weight of the source region in the overlay blend.
pub const IMAGE_WEIGHT: f32 = 0.7;

/// Weight of the heatmap in the overlay blend.
pub const HEAT_WEIGHT: f32 = 0.6;

const PANEL_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const LABEL_COLOR: Rgb<u8> = Rgb([60, 60, 60]);
const SUMMARY_COLOR: Rgb<u8> = Rgb([30, 30, 30]);
const TRACK_COLOR: Rgb<u8> = Rgb([210, 210, 210]);
const FILL_COLOR: Rgb<u8> = Rgb([255, 120, 50]);
const BORDER_COLOR: Rgb<u8> = Rgb([90, 90, 90]);

/// Panel layout, in pixels relative to the top of the panel or as a
/// fraction of the image width.
const GAUGE_TOP: u32 = 20;
const LABEL_BASELINE_ABOVE_GAUGE: u32 = 6;
const BAR_OFFSET: u32 = 10;
const BAR_HEIGHT: u32 = 14;
const BAR_WIDTH_FRACTION: f64 = 0.28;
const MARGIN_FRACTION: f64 = 0.06;
const SUMMARY_BASELINE: u32 = 60;

/// Compose the final visualization.
///
/// `mask` and `redness_map` must match the region's dimensions. The
/// output is `region.width() × (region.height() + PANEL_HEIGHT)`.
#[must_use = "returns the rendered visualization"]
pub fn render(
    region: &RgbImage,
    mask: &GrayImage,
    redness_map: &GrayImage,
    scores: &IndexScores,
) -> RgbImage {
    let overlay = heat_overlay(region, mask, redness_map);
    let (w, h) = overlay.dimensions();

    let mut canvas = RgbImage::from_pixel(w, h + PANEL_HEIGHT, PANEL_BACKGROUND);
    image::imageops::replace(&mut canvas, &overlay, 0, 0);

    let start = fraction_of(w, MARGIN_FRACTION);
    let gauges = [
        ("Redness", scores.redness),
        ("Blemish", scores.blemish),
        ("Tone", scores.tone_uniformity),
    ];
    for (x, (label, value)) in (0..).map(|i| start + (w / 3) * i).zip(gauges) {
        draw_gauge(&mut canvas, x, h, label, value);
    }

    draw_text(
        &mut canvas,
        i64::from(start),
        baseline_to_top(h + SUMMARY_BASELINE),
        &summary_line(scores),
        1,
        SUMMARY_COLOR,
    );

    canvas
}

/// Jet-coloured redness, masked to skin, blended onto the region.
#[must_use = "returns the blended overlay"]
pub fn heat_overlay(region: &RgbImage, mask: &GrayImage, redness_map: &GrayImage) -> RgbImage {
    let stretched = normalize_minmax(redness_map);
    RgbImage::from_fn(region.width(), region.height(), |x, y| {
        let heat = if mask.get_pixel(x, y).0[0] == SKIN {
            jet(stretched.get_pixel(x, y).0[0])
        } else {
            Rgb([0, 0, 0])
        };
        let src = region.get_pixel(x, y).0;
        Rgb(std::array::from_fn(|c| {
            saturate_u8(IMAGE_WEIGHT.mul_add(f32::from(src[c]), HEAT_WEIGHT * f32::from(heat.0[c])))
        }))
    })
}

/// Linearly stretch a map so its minimum becomes 0 and its maximum 255.
///
/// A constant map becomes all zeros.
#[must_use]
pub fn normalize_minmax(map: &GrayImage) -> GrayImage {
    let (lo, hi) = map
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
    if hi <= lo {
        return GrayImage::new(map.width(), map.height());
    }
    let scale = 255.0 / f32::from(hi - lo);
    GrayImage::from_fn(map.width(), map.height(), |x, y| {
        Luma([saturate_u8(f32::from(map.get_pixel(x, y).0[0] - lo) * scale)])
    })
}

/// Jet colormap: dark blue through cyan, yellow and red to dark red.
#[must_use]
pub fn jet(value: u8) -> Rgb<u8> {
    let t = f32::from(value) / 255.0;
    let channel = |centre: f32| saturate_u8(255.0 * (1.5 - 4.0f32.mul_add(t, -centre).abs()).clamp(0.0, 1.0));
    Rgb([channel(3.0), channel(2.0), channel(1.0)])
}

/// One-line summary classifying each score into its band.
#[must_use]
pub fn summary_line(scores: &IndexScores) -> String {
    let redness = match Band::classify(scores.redness) {
        Band::High => "HIGH",
        Band::Moderate => "MODERATE",
        Band::Low => "LOW",
    };
    let blemish = match Band::classify(scores.blemish) {
        Band::High => "MARKED",
        Band::Moderate => "MODERATE",
        Band::Low => "FAINT",
    };
    let tone = match Band::classify(scores.tone_uniformity) {
        Band::High => "GOOD",
        Band::Moderate => "MODERATE",
        Band::Low => "UNEVEN",
    };
    format!("REDNESS {redness} | BLEMISH {blemish} | TONE {tone}")
}

fn draw_gauge(canvas: &mut RgbImage, x: u32, image_height: u32, label: &str, value: f64) {
    let y0 = image_height + GAUGE_TOP;
    let bar_width = fraction_of(canvas.width(), BAR_WIDTH_FRACTION);

    draw_text(
        canvas,
        i64::from(x),
        baseline_to_top(y0 - LABEL_BASELINE_ABOVE_GAUGE),
        &format!("{label}: {value:.2}"),
        1,
        LABEL_COLOR,
    );

    let (Ok(left), Ok(top)) = (i32::try_from(x), i32::try_from(y0 + BAR_OFFSET)) else {
        return;
    };
    if bar_width == 0 {
        return;
    }
    draw_filled_rect_mut(canvas, Rect::at(left, top).of_size(bar_width, BAR_HEIGHT), TRACK_COLOR);

    let filled = fraction_of(bar_width, value.clamp(0.0, 1.0));
    if filled > 0 {
        draw_filled_rect_mut(canvas, Rect::at(left, top).of_size(filled, BAR_HEIGHT), FILL_COLOR);
    }
    draw_hollow_rect_mut(canvas, Rect::at(left, top).of_size(bar_width, BAR_HEIGHT), BORDER_COLOR);
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fraction_of(extent: u32, fraction: f64) -> u32 {
    (f64::from(extent) * fraction).floor() as u32
}

/// Text is positioned by its baseline; the font draws from the top.
fn baseline_to_top(baseline: u32) -> i64 {
    i64::from(baseline) - i64::from(GLYPH_HEIGHT)
}
