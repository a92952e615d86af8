//! Raw bytes to canonical RGB
//!
//! The format is detected from the leading magic bytes, the header is
//! checked against the pixel limit before any pixel data is decoded, and the
//! result is flattened onto opaque white so every downstream transform sees
//! the same color model.

use crate::constants::DEFAULT_MAX_PIXELS;
use crate::effects::PixelBuffer;
use crate::error::DecodeError;
use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageFormat, RgbaImage};
use rayon::prelude::*;
use std::io::Cursor;
use std::time::Instant;
use tracing::debug;

/// Turns fetched bytes into a [`PixelBuffer`].
///
/// This is the seam the pipeline is generic over, so tests can count or
/// forbid decode calls.
#[cfg_attr(test, mockall::automock)]
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, raw: &[u8]) -> Result<PixelBuffer, DecodeError>;
}

/// Decoder backed by the `image` crate codecs.
#[derive(Debug, Clone)]
pub struct RasterDecoder {
    max_pixels: u64,
}

impl Default for RasterDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PIXELS)
    }
}

impl RasterDecoder {
    pub fn new(max_pixels: u64) -> Self {
        Self { max_pixels }
    }

    pub fn from_config(config: &crate::config::DecoderConfig) -> Self {
        Self::new(config.max_pixels)
    }

    pub fn max_pixels(&self) -> u64 {
        self.max_pixels
    }

    fn check_dimensions(&self, width: u32, height: u32) -> Result<(), DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::Malformed(format!(
                "image has zero dimension ({}x{})",
                width, height
            )));
        }
        if width as u64 * height as u64 > self.max_pixels {
            return Err(DecodeError::too_many_pixels(width, height, self.max_pixels));
        }
        Ok(())
    }
}

impl ImageDecoder for RasterDecoder {
    fn decode(&self, raw: &[u8]) -> Result<PixelBuffer, DecodeError> {
        let start = Instant::now();
        let format = detect_format(raw)?;

        let (width, height) = ImageReader::with_format(Cursor::new(raw), format)
            .into_dimensions()
            .map_err(map_image_error)?;
        self.check_dimensions(width, height)?;

        let img = ImageReader::with_format(Cursor::new(raw), format)
            .decode()
            .map_err(map_image_error)?;
        let color = img.color();
        let buffer = normalize(&img);

        debug!(
            format = ?format,
            color = ?color,
            width = width,
            height = height,
            bytes = raw.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Decoded source image"
        );
        Ok(buffer)
    }
}

/// Identify the container format from its magic bytes.
pub fn detect_format(raw: &[u8]) -> Result<ImageFormat, DecodeError> {
    image::guess_format(raw).map_err(|_| {
        let prefix: Vec<String> = raw.iter().take(8).map(|b| format!("{:02x}", b)).collect();
        DecodeError::UnsupportedFormat(if prefix.is_empty() {
            "empty input".to_string()
        } else {
            format!("unrecognized signature {}", prefix.join(" "))
        })
    })
}

fn map_image_error(err: image::ImageError) -> DecodeError {
    match err {
        image::ImageError::Unsupported(e) => DecodeError::UnsupportedFormat(e.to_string()),
        other => DecodeError::Malformed(other.to_string()),
    }
}

/// Convert any decoded image to opaque 8-bit RGB.
///
/// Every color model that carries alpha (including palette images expanded
/// with transparency) is composited onto white with its own alpha channel.
/// Opaque models only change representation, so normalizing an RGB image
/// returns it unchanged.
pub fn normalize(img: &DynamicImage) -> PixelBuffer {
    if img.color().has_alpha() {
        flatten_onto_white(&img.to_rgba8())
    } else {
        img.to_rgb8()
    }
}

/// `round((c * a + 255 * (255 - a)) / 255)` per channel.
pub fn flatten_onto_white(rgba: &RgbaImage) -> PixelBuffer {
    let (width, height) = rgba.dimensions();
    let mut out = PixelBuffer::new(width, height);
    out.par_chunks_exact_mut(3)
        .zip(rgba.par_chunks_exact(4))
        .for_each(|(dst, src)| {
            let alpha = src[3] as u32;
            for c in 0..3 {
                dst[c] = ((src[c] as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
            }
        });
    out
}
