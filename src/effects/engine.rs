//! Applies a registered effect to a pixel buffer.
//!
//! The engine is a pure function over the registry: it never mutates its
//! input, never performs I/O and never branches on a specific effect.

use super::registry::{EffectId, Registry};
use super::PixelBuffer;
use crate::error::UnknownEffectError;
use std::time::Instant;
use tracing::debug;

/// Stateless effect dispatcher bound to one registry.
#[derive(Debug, Clone, Copy)]
pub struct EffectEngine<'r> {
    registry: &'r Registry,
}

impl<'r> EffectEngine<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Produce a new buffer with `effect` applied.
    ///
    /// The output has the same dimensions as `src` except for composites
    /// that contain a resize stage (`pro_enhance` always yields 512x512).
    pub fn apply(
        &self,
        src: &PixelBuffer,
        effect: EffectId,
    ) -> Result<PixelBuffer, UnknownEffectError> {
        let spec = self
            .registry
            .get(effect)
            .ok_or_else(|| UnknownEffectError::new(effect.as_str()))?;

        let start = Instant::now();
        let out = spec.apply(src);
        debug!(
            effect = effect.as_str(),
            kind = spec.kind(),
            width = src.width(),
            height = src.height(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Applied effect"
        );
        Ok(out)
    }

    /// Like [`apply`](Self::apply), looking the effect up by wire name.
    pub fn apply_named(
        &self,
        src: &PixelBuffer,
        name: &str,
    ) -> Result<PixelBuffer, UnknownEffectError> {
        let effect: EffectId = name.parse()?;
        self.apply(src, effect)
    }
}

impl EffectEngine<'static> {
    /// Engine over the built-in registry.
    pub fn global() -> Self {
        Self::new(Registry::global())
    }
}

impl Default for EffectEngine<'static> {
    fn default() -> Self {
        Self::global()
    }
}
