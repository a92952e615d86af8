//! Avatar effects
//!
//! - `kernel`: fixed 3x3 / 5x5 convolution kernels
//! - `tone`: per-pixel enhancement, tone mapping and inversion
//! - `composite`: multi-stage operations (resize, auto-contrast, unsharp, vignette)
//! - `registry`: `EffectId -> TransformSpec` table
//! - `engine`: applies a registered effect to a buffer

pub mod composite;
pub mod engine;
pub mod kernel;
pub mod registry;
pub mod tone;

/// Decoded, alpha-free 8-bit RGB image. Every effect consumes and produces
/// one of these.
pub type PixelBuffer = image::RgbImage;

pub use composite::{SimpleFilter, Stage, Vignette};
pub use engine::EffectEngine;
pub use kernel::Kernel;
pub use registry::{EffectId, Registry, TransformSpec};
pub use tone::{Dimension, Enhancement, ToneMap};
