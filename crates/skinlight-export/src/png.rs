//! PNG encoding of rendered visualizations.

use image::{ExtendedColorType, ImageEncoder, RgbImage};
use image::codecs::png::PngEncoder;

use crate::ExportError;

/// Encode an RGB image as PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::PngEncode`] if the encoder rejects the image
/// (for example, a zero-sized buffer).
pub fn to_png(image: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn output_has_png_signature() {
        let img = RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3]));
        let bytes = to_png(&img).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn decodes_back_to_same_pixels() {
        let img = RgbImage::from_fn(5, 4, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            image::Rgb([(x * 40) as u8, (y * 60) as u8, 7])
        });
        let bytes = to_png(&img).unwrap();
        let back = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(back, img);
    }

    #[test]
    fn encoding_is_deterministic() {
        let img = RgbImage::from_pixel(16, 16, image::Rgb([200, 150, 120]));
        assert_eq!(to_png(&img).unwrap(), to_png(&img).unwrap());
    }
}
