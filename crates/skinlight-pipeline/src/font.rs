//! Built-in 5×7 bitmap font for panel captions.
//!
//! Covers `A`–`Z` (lowercase is drawn as uppercase), `0`–`9`, space and
//! `: . , - / | ?`. Any other character renders as `?`.

use image::{Rgb, RgbImage};

/// Glyph width in font pixels.
pub const GLYPH_WIDTH: u32 = 5;

/// Glyph height in font pixels.
pub const GLYPH_HEIGHT: u32 = 7;

/// Horizontal advance per character in font pixels (glyph plus one
/// column of spacing).
pub const ADVANCE: u32 = GLYPH_WIDTH + 1;

/// Rows of a glyph, top to bottom; bit 4 is the leftmost column.
type Glyph = [u8; 7];

const UNKNOWN: Glyph = [
    0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100,
];

#[allow(clippy::too_many_lines)]
const fn glyph(ch: char) -> Glyph {
    match ch.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ' ' => [0; 7],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        ',' => [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b00100, 0b01000],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '/' => [0b00000, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b00000],
        '|' => [0b00100; 7],
        _ => UNKNOWN,
    }
}

/// Rendered width of `text` in image pixels at the given scale.
#[must_use]
pub fn text_width(text: &str, scale: u32) -> u32 {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    chars.saturating_mul(ADVANCE).saturating_mul(scale)
}

/// Draw `text` with its top-left corner at `(x, y)`.
///
/// Each font pixel becomes a `scale × scale` block. Pixels falling
/// outside the canvas are skipped.
pub fn draw_text(canvas: &mut RgbImage, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
    let scale = i64::from(scale.max(1));
    let mut pen_x = x;
    for ch in text.chars() {
        draw_glyph(canvas, pen_x, y, glyph(ch), scale, color);
        pen_x += i64::from(ADVANCE) * scale;
    }
}

fn draw_glyph(canvas: &mut RgbImage, x: i64, y: i64, rows: Glyph, scale: i64, color: Rgb<u8>) {
    for (row, bits) in (0i64..).zip(rows) {
        for col in 0..i64::from(GLYPH_WIDTH) {
            if bits & (1 << (4 - col)) == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    put(canvas, x + col * scale + dx, y + row * scale + dy, color);
                }
            }
        }
    }
}

fn put(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
        return;
    };
    if x < canvas.width() && y < canvas.height() {
        canvas.put_pixel(x, y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Rgb<u8> = Rgb([0, 0, 0]);
    const PAPER: Rgb<u8> = Rgb([255, 255, 255]);

    fn inked(canvas: &RgbImage) -> usize {
        canvas.pixels().filter(|p| **p == INK).count()
    }

    #[test]
    fn every_letter_and_digit_has_a_glyph() {
        for ch in ('A'..='Z').chain('0'..='9') {
            assert_ne!(glyph(ch), UNKNOWN, "{ch}");
            assert_ne!(glyph(ch), [0; 7], "{ch}");
        }
    }

    #[test]
    fn lowercase_maps_to_uppercase() {
        assert_eq!(glyph('r'), glyph('R'));
    }

    #[test]
    fn unknown_characters_render_as_question_mark() {
        assert_eq!(glyph('~'), glyph('?'));
    }

    #[test]
    fn text_width_counts_advance() {
        assert_eq!(text_width("TONE", 1), 24);
        assert_eq!(text_width("TONE", 2), 48);
        assert_eq!(text_width("", 3), 0);
    }

    #[test]
    fn draw_text_inks_pixels_inside_bounds() {
        let mut canvas = RgbImage::from_pixel(40, 10, PAPER);
        draw_text(&mut canvas, 1, 1, "I", 1, INK);
        // 'I' has 3 + 5 + 3 lit pixels.
        assert_eq!(inked(&canvas), 11);
        assert_eq!(*canvas.get_pixel(3, 2), INK);
    }

    #[test]
    fn scale_multiplies_ink() {
        let mut small = RgbImage::from_pixel(40, 40, PAPER);
        let mut large = RgbImage::from_pixel(40, 40, PAPER);
        draw_text(&mut small, 0, 0, "L", 1, INK);
        draw_text(&mut large, 0, 0, "L", 2, INK);
        assert_eq!(inked(&large), 4 * inked(&small));
    }

    #[test]
    fn space_draws_nothing() {
        let mut canvas = RgbImage::from_pixel(20, 10, PAPER);
        draw_text(&mut canvas, 0, 0, "   ", 1, INK);
        assert_eq!(inked(&canvas), 0);
    }

    #[test]
    fn clipped_text_does_not_panic() {
        let mut canvas = RgbImage::from_pixel(8, 4, PAPER);
        draw_text(&mut canvas, -3, -2, "REDNESS: 0.20", 2, INK);
        draw_text(&mut canvas, 100, 100, "X", 1, INK);
        assert!(inked(&canvas) > 0);
    }
}
