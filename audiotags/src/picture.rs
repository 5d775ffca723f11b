//! JPEG/PNG adapter over the `image` codec.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};

/// Quality used when embedding JPEG covers.
pub const JPEG_QUALITY: u8 = 65;

/// MIME type stored alongside an embedded picture of `format`.
pub fn mime_type(format: ImageFormat) -> Result<&'static str> {
    match format {
        ImageFormat::Jpeg => Ok("image/jpeg"),
        ImageFormat::Png => Ok("image/png"),
        other => Err(Error::UnsupportedFormat(other)),
    }
}

/// Encode `img` for embedding. Only JPEG and PNG are accepted.
pub fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY))?;
        }
        ImageFormat::Png => {
            img.write_with_encoder(PngEncoder::new(&mut buf))?;
        }
        other => return Err(Error::UnsupportedFormat(other)),
    }
    Ok(buf.into_inner())
}

/// Decode an embedded picture; the format is detected from the bytes.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}
