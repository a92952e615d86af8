//! Multi-stage effects.
//!
//! A composite effect is an ordered list of [`Stage`]s, each a function
//! `PixelBuffer -> PixelBuffer`. Stages run strictly in list order; the
//! output of one is the input of the next.

use super::kernel::Kernel;
use super::tone::{self, Enhancement, ToneMap};
use super::PixelBuffer;
use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::imageops;
use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_ellipse_mut;
use imageproc::filter::separable_filter_equal;
use rayon::prelude::*;
use std::num::NonZeroU32;

/// Single-kernel or single-op filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleFilter {
    Convolve(Kernel),
    Invert,
}

impl SimpleFilter {
    pub fn apply(&self, src: &PixelBuffer) -> PixelBuffer {
        match self {
            SimpleFilter::Convolve(kernel) => kernel.convolve(src),
            SimpleFilter::Invert => tone::invert(src),
        }
    }
}

/// One step of a composite effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Filter(SimpleFilter),
    Enhance(Enhancement),
    Tone(ToneMap),
    /// Exact resize with Lanczos3 resampling
    Resize { width: u32, height: u32 },
    /// Per-channel histogram stretch, discarding `cutoff_percent` of pixels
    /// from each tail
    AutoContrast { cutoff_percent: f64 },
    /// Add back `percent`% of the difference to a Gaussian blur of sigma
    /// `radius`, wherever that difference exceeds `threshold`
    UnsharpMask {
        radius: f32,
        percent: i32,
        threshold: i32,
    },
    Vignette(Vignette),
}

impl Stage {
    pub fn apply(&self, src: &PixelBuffer) -> PixelBuffer {
        match self {
            Stage::Filter(filter) => filter.apply(src),
            Stage::Enhance(enhancement) => enhancement.apply(src),
            Stage::Tone(tone_map) => tone_map.apply(src),
            Stage::Resize { width, height } => resize(src, *width, *height),
            Stage::AutoContrast { cutoff_percent } => auto_contrast(src, *cutoff_percent),
            Stage::UnsharpMask {
                radius,
                percent,
                threshold,
            } => unsharp_mask(src, *radius, *percent, *threshold),
            Stage::Vignette(vignette) => vignette.apply(src),
        }
    }

    /// Stage name for debug logging.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Filter(SimpleFilter::Invert) => "invert",
            Stage::Filter(SimpleFilter::Convolve(_)) => "convolve",
            Stage::Enhance(_) => "enhance",
            Stage::Tone(_) => "tone",
            Stage::Resize { .. } => "resize",
            Stage::AutoContrast { .. } => "auto_contrast",
            Stage::UnsharpMask { .. } => "unsharp_mask",
            Stage::Vignette(_) => "vignette",
        }
    }
}

/// Run `stages` in order. An empty list is the identity.
pub fn run_stages(src: &PixelBuffer, stages: &[Stage]) -> PixelBuffer {
    let mut current = src.clone();
    for stage in stages {
        tracing::trace!(stage = stage.name(), "Applying composite stage");
        current = stage.apply(&current);
    }
    current
}

/// Resize to exactly `width`x`height` with Lanczos3.
///
/// Uses fast_image_resize; falls back to `image::imageops::resize` if the
/// fast path rejects the buffers.
pub fn resize(src: &PixelBuffer, width: u32, height: u32) -> PixelBuffer {
    if src.dimensions() == (width, height) {
        return src.clone();
    }
    if src.width() == 0 || src.height() == 0 || width == 0 || height == 0 {
        return PixelBuffer::new(width, height);
    }
    match resize_fast(src, width, height) {
        Ok(resized) => resized,
        Err(message) => {
            tracing::warn!(
                error = %message,
                "fast_image_resize failed, falling back to imageops::resize"
            );
            imageops::resize(src, width, height, imageops::FilterType::Lanczos3)
        }
    }
}

fn resize_fast(src: &PixelBuffer, width: u32, height: u32) -> Result<PixelBuffer, String> {
    let src_width = NonZeroU32::new(src.width()).ok_or("Source width is 0")?;
    let src_height = NonZeroU32::new(src.height()).ok_or("Source height is 0")?;
    let dst_width = NonZeroU32::new(width).ok_or("Target width is 0")?;
    let dst_height = NonZeroU32::new(height).ok_or("Target height is 0")?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        src.as_raw().clone(),
        PixelType::U8x3,
    )
    .map_err(|e| format!("Failed to create source image: {:?}", e))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x3);
    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| format!("Resize operation failed: {:?}", e))?;

    PixelBuffer::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| "Resized buffer has unexpected length".to_string())
}

/// Build the 256-entry stretch table for one channel histogram.
///
/// `cutoff_percent` of the total pixel count is removed from each end of
/// the histogram before locating the lowest and highest occupied bins.
/// Those bins are stretched to 0 and 255.
fn stretch_lut(histogram: &[u64; 256], cutoff_percent: f64) -> [u8; 256] {
    let mut identity = [0u8; 256];
    for (i, v) in identity.iter_mut().enumerate() {
        *v = i as u8;
    }

    let mut h = *histogram;
    let total: u64 = h.iter().sum();
    let cut = (total as f64 * cutoff_percent / 100.0).floor() as u64;

    if cut > 0 {
        let mut remaining = cut;
        for bin in h.iter_mut() {
            if remaining > *bin {
                remaining -= *bin;
                *bin = 0;
            } else {
                *bin -= remaining;
                break;
            }
        }
        let mut remaining = cut;
        for bin in h.iter_mut().rev() {
            if remaining > *bin {
                remaining -= *bin;
                *bin = 0;
            } else {
                *bin -= remaining;
                break;
            }
        }
    }

    let lo = h.iter().position(|&c| c != 0);
    let hi = h.iter().rposition(|&c| c != 0);
    let (lo, hi) = match (lo, hi) {
        (Some(lo), Some(hi)) if hi > lo => (lo as f64, hi as f64),
        _ => return identity,
    };

    let scale = 255.0 / (hi - lo);
    let offset = -lo * scale;
    let mut lut = [0u8; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        // Truncated, not rounded
        let mapped = (i as f64 * scale + offset) as i64;
        *v = mapped.clamp(0, 255) as u8;
    }
    lut
}

/// Stretch each channel independently so its histogram spans 0..=255.
pub fn auto_contrast(src: &PixelBuffer, cutoff_percent: f64) -> PixelBuffer {
    let mut histograms = [[0u64; 256]; 3];
    for px in src.pixels() {
        for (c, &v) in px.0.iter().enumerate() {
            histograms[c][v as usize] += 1;
        }
    }

    let luts = [
        stretch_lut(&histograms[0], cutoff_percent),
        stretch_lut(&histograms[1], cutoff_percent),
        stretch_lut(&histograms[2], cutoff_percent),
    ];

    tone::map_pixels(src, |[r, g, b]| {
        [
            luts[0][r as usize],
            luts[1][g as usize],
            luts[2][b as usize],
        ]
    })
}

/// Unsharp mask with an explicit amount.
///
/// `image::imageops::unsharpen` has no amount parameter, so only the blur
/// comes from the image crate.
pub fn unsharp_mask(src: &PixelBuffer, radius: f32, percent: i32, threshold: i32) -> PixelBuffer {
    let blurred = imageops::blur(src, radius);
    let amount = percent as f32 / 100.0;

    let mut out = src.clone();
    out.par_iter_mut()
        .zip(blurred.as_raw().par_iter())
        .for_each(|(v, &b)| {
            let diff = *v as i32 - b as i32;
            if diff.abs() > threshold {
                let sharpened = *v as f32 + diff as f32 * amount;
                *v = sharpened.round().clamp(0.0, 255.0) as u8;
            }
        });
    out
}

/// Soft radial darkening.
///
/// A single-channel mask starts fully white; an ellipse of 0 covering the
/// bounding box `(-inset, -inset)..(1 + inset, 1 + inset)` (fractions of the
/// image size) is drawn, so only the far corners stay white. After a
/// Gaussian blur of `blur_sigma` with edge pixels extended past the border,
/// the mask is the per-pixel weight of black: `out = v * (255 - m) / 255`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vignette {
    pub inset: f32,
    pub blur_sigma: f32,
}

impl Vignette {
    pub const CINEMATIC: Vignette = Vignette {
        inset: 0.15,
        blur_sigma: 90.0,
    };

    /// Build the blurred mask for a `width`x`height` image.
    pub fn mask(&self, width: u32, height: u32) -> GrayImage {
        let mut mask = GrayImage::from_pixel(width, height, Luma([255]));
        if width == 0 || height == 0 {
            return mask;
        }

        let center = (
            (width as f32 / 2.0).round() as i32,
            (height as f32 / 2.0).round() as i32,
        );
        let radius_x = (width as f32 * (0.5 + self.inset)).round() as i32;
        let radius_y = (height as f32 * (0.5 + self.inset)).round() as i32;
        draw_filled_ellipse_mut(&mut mask, center, radius_x, radius_y, Luma([0]));

        if self.blur_sigma <= 0.0 {
            return mask;
        }
        separable_filter_equal(&mask, &gaussian_kernel(self.blur_sigma))
    }

    pub fn apply(&self, src: &PixelBuffer) -> PixelBuffer {
        let (width, height) = src.dimensions();
        let mask = self.mask(width, height);

        let mut out = src.clone();
        out.par_chunks_exact_mut(3)
            .zip(mask.as_raw().par_iter())
            .for_each(|(px, &m)| {
                let keep = 255 - m as u32;
                for v in px.iter_mut() {
                    *v = ((*v as u32 * keep + 127) / 255) as u8;
                }
            });
        out
    }
}

/// Normalized 1-D Gaussian covering +-3 sigma. Weights are never
/// renormalized at the border; the filter clamps to edge pixels instead.
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil() as i32;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for v in kernel.iter_mut() {
        *v /= sum;
    }
    kernel
}

/// The fixed eight-stage portrait enhancement.
pub fn pro_enhance_stages() -> Vec<Stage> {
    vec![
        Stage::Resize {
            width: 512,
            height: 512,
        },
        Stage::AutoContrast {
            cutoff_percent: 1.0,
        },
        Stage::UnsharpMask {
            radius: 1.6,
            percent: 110,
            threshold: 4,
        },
        Stage::Enhance(Enhancement::brightness(1.04)),
        Stage::Enhance(Enhancement::contrast(1.12)),
        Stage::Enhance(Enhancement::color(1.15)),
        Stage::Filter(SimpleFilter::Convolve(Kernel::SMOOTH)),
        Stage::Vignette(Vignette::CINEMATIC),
    ]
}

/// Grayscale followed by the sepia tone map.
pub fn sepia_stages() -> Vec<Stage> {
    vec![
        Stage::Enhance(Enhancement::color(0.0)),
        Stage::Tone(ToneMap::SEPIA),
    ]
}
