//! Fixed convolution kernels for the simple-filter effects.
//!
//! Each kernel is applied per channel as
//! `clamp(round(sum(weight * sample) / scale + offset), 0, 255)`.
//! Samples outside the image clamp to the nearest edge pixel.

use super::PixelBuffer;
use rayon::prelude::*;

/// A square convolution kernel with its normalization constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel {
    /// Side length (3 or 5)
    pub size: usize,
    /// Row-major weights, `size * size` entries
    pub weights: &'static [i32],
    /// Divisor applied to the weighted sum
    pub scale: i32,
    /// Added after scaling
    pub offset: i32,
}

impl Kernel {
    /// Ring of ones around a hollow centre.
    #[rustfmt::skip]
    pub const BLUR: Kernel = Kernel {
        size: 5,
        weights: &[
            1, 1, 1, 1, 1,
            1, 0, 0, 0, 1,
            1, 0, 0, 0, 1,
            1, 0, 0, 0, 1,
            1, 1, 1, 1, 1,
        ],
        scale: 16,
        offset: 0,
    };

    pub const CONTOUR: Kernel = Kernel {
        size: 3,
        weights: &[-1, -1, -1, -1, 8, -1, -1, -1, -1],
        scale: 1,
        offset: 255,
    };

    pub const DETAIL: Kernel = Kernel {
        size: 3,
        weights: &[0, -1, 0, -1, 10, -1, 0, -1, 0],
        scale: 6,
        offset: 0,
    };

    pub const EDGE_ENHANCE: Kernel = Kernel {
        size: 3,
        weights: &[-1, -1, -1, -1, 10, -1, -1, -1, -1],
        scale: 2,
        offset: 0,
    };

    pub const EDGE_ENHANCE_MORE: Kernel = Kernel {
        size: 3,
        weights: &[-1, -1, -1, -1, 9, -1, -1, -1, -1],
        scale: 1,
        offset: 0,
    };

    /// Upper-left to centre relief.
    pub const EMBOSS: Kernel = Kernel {
        size: 3,
        weights: &[-1, 0, 0, 0, 1, 0, 0, 0, 0],
        scale: 1,
        offset: 128,
    };

    pub const FIND_EDGES: Kernel = Kernel {
        size: 3,
        weights: &[-1, -1, -1, -1, 8, -1, -1, -1, -1],
        scale: 1,
        offset: 0,
    };

    pub const SHARPEN: Kernel = Kernel {
        size: 3,
        weights: &[-2, -2, -2, -2, 32, -2, -2, -2, -2],
        scale: 16,
        offset: 0,
    };

    pub const SMOOTH: Kernel = Kernel {
        size: 3,
        weights: &[1, 1, 1, 1, 5, 1, 1, 1, 1],
        scale: 13,
        offset: 0,
    };

    #[rustfmt::skip]
    pub const SMOOTH_MORE: Kernel = Kernel {
        size: 5,
        weights: &[
            1, 1,  1, 1, 1,
            1, 5,  5, 5, 1,
            1, 5, 44, 5, 1,
            1, 5,  5, 5, 1,
            1, 1,  1, 1, 1,
        ],
        scale: 100,
        offset: 0,
    };

    /// Convert an accumulated weighted sum to an output sample.
    #[inline]
    fn finish(&self, acc: i32) -> u8 {
        let value = acc as f32 / self.scale as f32 + self.offset as f32;
        value.round().clamp(0.0, 255.0) as u8
    }

    /// Convolve the whole buffer, producing a new one of the same size.
    ///
    /// Output rows are computed in parallel; each row reads only from `src`.
    pub fn convolve(&self, src: &PixelBuffer) -> PixelBuffer {
        let (width, height) = src.dimensions();
        let mut out = PixelBuffer::new(width, height);
        if width == 0 || height == 0 {
            return out;
        }

        let w = width as i64;
        let h = height as i64;
        let radius = (self.size / 2) as i64;
        let stride = width as usize * 3;
        let raw = src.as_raw();

        out.par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..w {
                    let mut acc = [0i32; 3];
                    for ky in 0..self.size {
                        let sy = (y as i64 + ky as i64 - radius).clamp(0, h - 1);
                        for kx in 0..self.size {
                            let weight = self.weights[ky * self.size + kx];
                            if weight == 0 {
                                continue;
                            }
                            let sx = (x + kx as i64 - radius).clamp(0, w - 1);
                            let idx = ((sy * w + sx) * 3) as usize;
                            acc[0] += weight * raw[idx] as i32;
                            acc[1] += weight * raw[idx + 1] as i32;
                            acc[2] += weight * raw[idx + 2] as i32;
                        }
                    }
                    let base = x as usize * 3;
                    row[base] = self.finish(acc[0]);
                    row[base + 1] = self.finish(acc[1]);
                    row[base + 2] = self.finish(acc[2]);
                }
            });

        out
    }
}
