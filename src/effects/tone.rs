//! Per-pixel photometric operations: luminance, enhancement, tone mapping,
//! inversion.
//!
//! Every operation here is a pure function of one pixel, so they all go
//! through [`map_pixels`], which runs the closure over contiguous RGB
//! triples in parallel.

use super::PixelBuffer;
use rayon::prelude::*;

/// Mid-gray reference used by the contrast enhancement.
pub const CONTRAST_BASE: f32 = 128.0;

/// ITU-R 601-2 luma in 16-bit fixed point, rounded.
///
/// The weights sum to 65536, so a neutral pixel `(v, v, v)` maps to `v`.
#[inline]
pub fn luma(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb;
    ((19595 * r as u32 + 38470 * g as u32 + 7471 * b as u32 + 0x8000) >> 16) as u8
}

#[inline]
fn clamp_round(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Apply `f` to every pixel, returning a new buffer.
pub fn map_pixels<F>(src: &PixelBuffer, f: F) -> PixelBuffer
where
    F: Fn([u8; 3]) -> [u8; 3] + Sync,
{
    let mut out = src.clone();
    out.par_chunks_exact_mut(3).for_each(|px| {
        let mapped = f([px[0], px[1], px[2]]);
        px.copy_from_slice(&mapped);
    });
    out
}

/// Which photometric quantity an [`Enhancement`] scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Scale towards black (base 0)
    Brightness,
    /// Scale the deviation from mid-gray (base 128)
    Contrast,
    /// Scale the deviation from the pixel's own luma
    Color,
}

/// `clamp(round(base + (value - base) * factor), 0, 255)` per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Enhancement {
    pub dimension: Dimension,
    pub factor: f32,
}

impl Enhancement {
    pub const fn new(dimension: Dimension, factor: f32) -> Self {
        Self { dimension, factor }
    }

    pub const fn brightness(factor: f32) -> Self {
        Self::new(Dimension::Brightness, factor)
    }

    pub const fn contrast(factor: f32) -> Self {
        Self::new(Dimension::Contrast, factor)
    }

    pub const fn color(factor: f32) -> Self {
        Self::new(Dimension::Color, factor)
    }

    #[inline]
    pub fn enhance_pixel(&self, rgb: [u8; 3]) -> [u8; 3] {
        let base = match self.dimension {
            Dimension::Brightness => 0.0,
            Dimension::Contrast => CONTRAST_BASE,
            Dimension::Color => luma(rgb) as f32,
        };
        rgb.map(|v| clamp_round(base + (v as f32 - base) * self.factor))
    }

    pub fn apply(&self, src: &PixelBuffer) -> PixelBuffer {
        map_pixels(src, |px| self.enhance_pixel(px))
    }
}

/// Replace each pixel by its luma scaled per channel.
///
/// Sepia is `ToneMap([1.0, 0.95, 0.82])` over a grayscale image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneMap {
    pub weights: [f32; 3],
}

impl ToneMap {
    pub const SEPIA: ToneMap = ToneMap {
        weights: [1.0, 0.95, 0.82],
    };

    #[inline]
    pub fn tone_pixel(&self, rgb: [u8; 3]) -> [u8; 3] {
        let g = luma(rgb) as f32;
        self.weights.map(|w| clamp_round(g * w))
    }

    pub fn apply(&self, src: &PixelBuffer) -> PixelBuffer {
        map_pixels(src, |px| self.tone_pixel(px))
    }
}

/// `255 - v` on every channel.
pub fn invert(src: &PixelBuffer) -> PixelBuffer {
    map_pixels(src, |px| px.map(|v| 255 - v))
}
