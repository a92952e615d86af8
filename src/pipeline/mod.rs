// Render pipeline - fetch, decode, apply effect, encode
//
// Fetching is async; everything CPU-bound runs on tokio's blocking pool so
// the runtime threads stay responsive.

use bytes::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::decoder::{ImageDecoder, RasterDecoder};
use crate::effects::{EffectEngine, EffectId, Registry};
use crate::encoder::encode_png;
use crate::error::{PipelineError, UnknownEffectError};
use crate::fetcher::{HttpFetcher, SourceFetcher};
use crate::metrics::PipelineMetrics;

/// An encoded avatar ready to be attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub data: Bytes,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub effect: EffectId,
}

impl RenderedImage {
    pub fn content_length(&self) -> usize {
        self.data.len()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Suggested attachment name, e.g. `avatar_sepia.png`
    pub fn file_name(&self) -> String {
        self.effect.file_name()
    }
}

/// Decode, apply and encode synchronously.
///
/// This is the CPU-bound half of a render; [`EffectPipeline`] runs it on the
/// blocking pool.
pub fn process<D>(
    decoder: &D,
    registry: &Registry,
    raw: &[u8],
    effect: EffectId,
) -> Result<RenderedImage, PipelineError>
where
    D: ImageDecoder + ?Sized,
{
    let buffer = decoder.decode(raw)?;
    let output = EffectEngine::new(registry).apply(&buffer, effect)?;
    let encoded = encode_png(&output)?;
    let (width, height) = encoded.dimensions;

    Ok(RenderedImage {
        data: encoded.data,
        content_type: encoded.content_type,
        width,
        height,
        effect,
    })
}

/// Fetch -> decode -> effect -> encode.
///
/// The pipeline holds no mutable state; a single instance can serve
/// concurrent renders.
pub struct EffectPipeline<F = HttpFetcher, D = RasterDecoder> {
    fetcher: F,
    decoder: Arc<D>,
    registry: &'static Registry,
    processing_timeout: Option<Duration>,
}

impl EffectPipeline<HttpFetcher, RasterDecoder> {
    /// Build the default HTTP pipeline from configuration.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let fetcher = HttpFetcher::new(&config.fetcher)?;
        let decoder = RasterDecoder::from_config(&config.decoder);
        let mut pipeline = Self::new(fetcher, decoder);
        pipeline.processing_timeout = config.pipeline.processing_timeout();
        Ok(pipeline)
    }
}

impl<F, D> EffectPipeline<F, D>
where
    F: SourceFetcher,
    D: ImageDecoder + 'static,
{
    pub fn new(fetcher: F, decoder: D) -> Self {
        Self {
            fetcher,
            decoder: Arc::new(decoder),
            registry: Registry::global(),
            processing_timeout: None,
        }
    }

    /// Use a different effect table (the built-in one by default).
    pub fn with_registry(mut self, registry: &'static Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Bound every [`render`](Self::render) by a wall-clock budget.
    pub fn with_processing_timeout(mut self, budget: Duration) -> Self {
        self.processing_timeout = Some(budget);
        self
    }

    pub fn processing_timeout(&self) -> Option<Duration> {
        self.processing_timeout
    }

    /// Render `effect` over the image at `url`.
    ///
    /// Applies the configured processing timeout, if any.
    pub async fn render(&self, url: &str, effect: EffectId) -> Result<RenderedImage, PipelineError> {
        let result = match self.processing_timeout {
            Some(budget) => self.run_with_budget(url, effect, budget).await,
            None => self.run(url, effect).await,
        };
        self.finish(url, effect, result)
    }

    /// Like [`render`](Self::render), parsing the effect from its wire name.
    pub async fn render_named(
        &self,
        url: &str,
        effect: &str,
    ) -> Result<RenderedImage, PipelineError> {
        let effect: EffectId = match effect.parse() {
            Ok(effect) => effect,
            Err(e) => {
                let err = PipelineError::from(e);
                error!(url = url, error = %err, "Rejected unknown effect name");
                PipelineMetrics::global().record_render("unknown", err.stage());
                return Err(err);
            }
        };
        self.render(url, effect).await
    }

    /// Render with an explicit wall-clock budget.
    ///
    /// When the budget elapses the result is discarded and
    /// `PipelineError::DeadlineExceeded` is returned. A blocking worker that
    /// is already running finishes in the background.
    pub async fn render_within(
        &self,
        url: &str,
        effect: EffectId,
        budget: Duration,
    ) -> Result<RenderedImage, PipelineError> {
        let result = self.run_with_budget(url, effect, budget).await;
        self.finish(url, effect, result)
    }

    async fn run_with_budget(
        &self,
        url: &str,
        effect: EffectId,
        budget: Duration,
    ) -> Result<RenderedImage, PipelineError> {
        match tokio::time::timeout(budget, self.run(url, effect)).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::DeadlineExceeded {
                budget_ms: budget.as_millis() as u64,
            }),
        }
    }

    async fn run(&self, url: &str, effect: EffectId) -> Result<RenderedImage, PipelineError> {
        // Fail before any network I/O when the effect cannot be applied
        if !self.registry.contains(effect) {
            return Err(UnknownEffectError::new(effect.as_str()).into());
        }

        let metrics = PipelineMetrics::global();

        let fetch_start = Instant::now();
        let raw = self.fetcher.fetch(url).await?;
        metrics.record_stage("fetch", fetch_start.elapsed());
        metrics.record_source_bytes(raw.len());

        let decoder = Arc::clone(&self.decoder);
        let registry = self.registry;
        let process_start = Instant::now();
        let rendered = tokio::task::spawn_blocking(move || {
            process(&*decoder, registry, &raw, effect)
        })
        .await
        .map_err(|e| PipelineError::Worker(e.to_string()))??;
        metrics.record_stage("process", process_start.elapsed());

        Ok(rendered)
    }

    fn finish(
        &self,
        url: &str,
        effect: EffectId,
        result: Result<RenderedImage, PipelineError>,
    ) -> Result<RenderedImage, PipelineError> {
        let metrics = PipelineMetrics::global();
        match &result {
            Ok(image) => {
                metrics.record_render(effect.as_str(), "ok");
                info!(
                    url = url,
                    effect = effect.as_str(),
                    width = image.width,
                    height = image.height,
                    bytes = image.content_length(),
                    "Rendered avatar"
                );
            }
            Err(err) => {
                metrics.record_render(effect.as_str(), err.stage());
                if err.is_internal() {
                    error!(
                        url = url,
                        effect = effect.as_str(),
                        stage = err.stage(),
                        error = %err,
                        "Render failed"
                    );
                } else {
                    warn!(
                        url = url,
                        effect = effect.as_str(),
                        stage = err.stage(),
                        error = %err,
                        "Render failed"
                    );
                }
            }
        }
        result
    }
}
