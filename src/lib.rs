// avatar-fx library
//
// Fetch a portrait over HTTP(S), flatten it to RGB, apply one named effect
// and re-encode it as PNG.

pub mod config;
pub mod constants;
pub mod decoder;
pub mod effects;
pub mod encoder;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod metrics;
pub mod pipeline;

pub use effects::{EffectEngine, EffectId, PixelBuffer, Registry};
pub use error::PipelineError;
pub use pipeline::{EffectPipeline, RenderedImage};
