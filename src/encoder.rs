//! PNG output encoding
//!
//! Output is always lossless PNG regardless of the source format.

use crate::effects::PixelBuffer;
use crate::error::EncodeError;
use bytes::Bytes;
use std::io::Cursor;

pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Result of encoding a buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// The encoded image data
    pub data: Bytes,
    /// Content-Type header value
    pub content_type: &'static str,
    /// Encoded dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl EncodedImage {
    pub fn content_length(&self) -> usize {
        self.data.len()
    }
}

/// Encode an RGB buffer as PNG.
pub fn encode_png(buffer: &PixelBuffer) -> Result<EncodedImage, EncodeError> {
    use image::codecs::png::PngEncoder;
    use image::ImageEncoder as _;

    let (width, height) = buffer.dimensions();
    if width == 0 || height == 0 {
        return Err(EncodeError::new(
            "png",
            format!("cannot encode empty buffer ({}x{})", width, height),
        ));
    }

    let mut output = Cursor::new(Vec::new());
    PngEncoder::new(&mut output)
        .write_image(buffer.as_raw(), width, height, image::ColorType::Rgb8)
        .map_err(|e| EncodeError::new("png", e.to_string()))?;

    Ok(EncodedImage {
        data: Bytes::from(output.into_inner()),
        content_type: PNG_CONTENT_TYPE,
        dimensions: (width, height),
    })
}
