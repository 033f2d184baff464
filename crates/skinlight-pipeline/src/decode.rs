//! Image decoding from in-memory bytes.

use std::io::Cursor;

use image::{DynamicImage, ImageDecoder, ImageReader, ImageResult, RgbImage};

use crate::types::PipelineError;

/// Decode raw image bytes into 8-bit RGB, upright.
///
/// Supports PNG, JPEG, BMP, and WebP (whatever the enabled `image`
/// codecs can decode). An EXIF orientation tag is applied, so a phone
/// portrait stored sideways comes out the way it was shot. Alpha is
/// discarded and grayscale or 16-bit sources are converted to three
/// 8-bit channels.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    Ok(decode_oriented(bytes)?.to_rgb8())
}

fn decode_oriented(bytes: &[u8]) -> ImageResult<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}
