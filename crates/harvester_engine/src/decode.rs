use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("bytes are not a decodable image: {0}")]
    NotAnImage(String),
    #[error("failed to encode image as {format}: {message}")]
    EncodeFailure { format: String, message: String },
}

/// Decode `bytes` with whatever codec the signature points at.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    image::load_from_memory(bytes).map_err(|err| DecodeError::NotAnImage(err.to_string()))
}

/// Re-encode a decoded image as baseline JPEG.
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, DecodeError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|err| DecodeError::EncodeFailure {
            format: "jpeg".into(),
            message: err.to_string(),
        })?;
    Ok(out.into_inner())
}
