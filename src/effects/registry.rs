//! Effect vocabulary and the immutable effect table.
//!
//! Adding an effect means adding an [`EffectId`] variant and one entry in
//! [`Registry::builtin`]; the engine never branches on individual effects.

use super::composite::{pro_enhance_stages, run_stages, sepia_stages, SimpleFilter, Stage};
use super::kernel::Kernel;
use super::tone::Enhancement;
use super::PixelBuffer;
use crate::error::UnknownEffectError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Every effect a caller can request, including `None` (no effect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectId {
    None,
    Blur,
    Contour,
    Detail,
    EdgeEnhance,
    EdgeEnhanceMore,
    Emboss,
    FindEdges,
    Sharpen,
    Smooth,
    SmoothMore,
    Grayscale,
    Sepia,
    Invert,
    Brighten,
    Darken,
    HighContrast,
    LowContrast,
    Saturate,
    Desaturate,
    ProEnhance,
}

impl EffectId {
    pub const ALL: [EffectId; 21] = [
        EffectId::None,
        EffectId::Blur,
        EffectId::Contour,
        EffectId::Detail,
        EffectId::EdgeEnhance,
        EffectId::EdgeEnhanceMore,
        EffectId::Emboss,
        EffectId::FindEdges,
        EffectId::Sharpen,
        EffectId::Smooth,
        EffectId::SmoothMore,
        EffectId::Grayscale,
        EffectId::Sepia,
        EffectId::Invert,
        EffectId::Brighten,
        EffectId::Darken,
        EffectId::HighContrast,
        EffectId::LowContrast,
        EffectId::Saturate,
        EffectId::Desaturate,
        EffectId::ProEnhance,
    ];

    /// Wire name, e.g. `edge_enhance_more`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectId::None => "none",
            EffectId::Blur => "blur",
            EffectId::Contour => "contour",
            EffectId::Detail => "detail",
            EffectId::EdgeEnhance => "edge_enhance",
            EffectId::EdgeEnhanceMore => "edge_enhance_more",
            EffectId::Emboss => "emboss",
            EffectId::FindEdges => "find_edges",
            EffectId::Sharpen => "sharpen",
            EffectId::Smooth => "smooth",
            EffectId::SmoothMore => "smooth_more",
            EffectId::Grayscale => "grayscale",
            EffectId::Sepia => "sepia",
            EffectId::Invert => "invert",
            EffectId::Brighten => "brighten",
            EffectId::Darken => "darken",
            EffectId::HighContrast => "high_contrast",
            EffectId::LowContrast => "low_contrast",
            EffectId::Saturate => "saturate",
            EffectId::Desaturate => "desaturate",
            EffectId::ProEnhance => "pro_enhance",
        }
    }

    /// Human label, e.g. `Edge Enhance More`.
    pub fn display_name(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Attachment file name for the rendered result.
    pub fn file_name(&self) -> String {
        format!("avatar_{}.png", self.as_str())
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectId {
    type Err = UnknownEffectError;

    /// Accepts the wire name, case-insensitively, with surrounding
    /// whitespace ignored. An empty string means `None`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Ok(EffectId::None);
        }
        EffectId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| UnknownEffectError::new(s))
    }
}

/// Declarative description of one effect.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformSpec {
    SimpleFilter(SimpleFilter),
    Enhancement(Enhancement),
    Composite(Vec<Stage>),
}

impl TransformSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            TransformSpec::SimpleFilter(_) => "simple_filter",
            TransformSpec::Enhancement(_) => "enhancement",
            TransformSpec::Composite(_) => "composite",
        }
    }

    pub fn apply(&self, src: &PixelBuffer) -> PixelBuffer {
        match self {
            TransformSpec::SimpleFilter(filter) => filter.apply(src),
            TransformSpec::Enhancement(enhancement) => enhancement.apply(src),
            TransformSpec::Composite(stages) => run_stages(src, stages),
        }
    }
}

/// Immutable `EffectId -> TransformSpec` table.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: HashMap<EffectId, TransformSpec>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

impl Registry {
    /// Process-wide built-in table, constructed on first use.
    pub fn global() -> &'static Registry {
        REGISTRY.get_or_init(Registry::builtin)
    }

    /// A table with exactly the given entries. Later duplicates win.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (EffectId, TransformSpec)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// The full built-in effect table.
    pub fn builtin() -> Self {
        use TransformSpec::{Composite, Enhancement as Enhance, SimpleFilter as Filter};

        let convolve = |kernel: Kernel| Filter(SimpleFilter::Convolve(kernel));

        Self::from_entries([
            (EffectId::None, Composite(Vec::new())),
            (EffectId::Blur, convolve(Kernel::BLUR)),
            (EffectId::Contour, convolve(Kernel::CONTOUR)),
            (EffectId::Detail, convolve(Kernel::DETAIL)),
            (EffectId::EdgeEnhance, convolve(Kernel::EDGE_ENHANCE)),
            (EffectId::EdgeEnhanceMore, convolve(Kernel::EDGE_ENHANCE_MORE)),
            (EffectId::Emboss, convolve(Kernel::EMBOSS)),
            (EffectId::FindEdges, convolve(Kernel::FIND_EDGES)),
            (EffectId::Sharpen, convolve(Kernel::SHARPEN)),
            (EffectId::Smooth, convolve(Kernel::SMOOTH)),
            (EffectId::SmoothMore, convolve(Kernel::SMOOTH_MORE)),
            (EffectId::Grayscale, Enhance(Enhancement::color(0.0))),
            (EffectId::Sepia, Composite(sepia_stages())),
            (EffectId::Invert, Filter(SimpleFilter::Invert)),
            (EffectId::Brighten, Enhance(Enhancement::brightness(1.5))),
            (EffectId::Darken, Enhance(Enhancement::brightness(0.6))),
            (EffectId::HighContrast, Enhance(Enhancement::contrast(2.0))),
            (EffectId::LowContrast, Enhance(Enhancement::contrast(0.5))),
            (EffectId::Saturate, Enhance(Enhancement::color(2.0))),
            (EffectId::Desaturate, Enhance(Enhancement::color(0.3))),
            (EffectId::ProEnhance, Composite(pro_enhance_stages())),
        ])
    }

    pub fn get(&self, id: EffectId) -> Option<&TransformSpec> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: EffectId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids in declaration order.
    pub fn ids(&self) -> Vec<EffectId> {
        let mut ids: Vec<EffectId> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }
}
