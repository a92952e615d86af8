//! Prometheus metrics for the render pipeline
//!
//! Metrics are registered once in the default prometheus registry:
//! - `avatar_fx_renders_total{effect, outcome}`
//! - `avatar_fx_stage_duration_seconds{stage}` (fetch, process)
//! - `avatar_fx_source_bytes`

use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Encoder, Histogram,
    HistogramVec, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Duration;

/// Global metrics for rendered avatars
pub struct PipelineMetrics {
    /// Completed renders by effect and outcome (`ok` or an error stage)
    pub renders: IntCounterVec,

    /// Wall-clock duration of each pipeline stage
    pub stage_duration: HistogramVec,

    /// Size of fetched source bodies
    pub source_bytes: Histogram,
}

static METRICS: OnceLock<PipelineMetrics> = OnceLock::new();

impl PipelineMetrics {
    /// Initialize and return the global metrics instance.
    ///
    /// Subsequent calls return the same instance.
    pub fn global() -> &'static Self {
        METRICS.get_or_init(|| {
            let renders = register_int_counter_vec!(
                "avatar_fx_renders_total",
                "Total number of avatar renders by effect and outcome",
                &["effect", "outcome"]
            )
            .expect("Failed to register avatar_fx_renders_total metric");

            let stage_duration = register_histogram_vec!(
                "avatar_fx_stage_duration_seconds",
                "Duration of pipeline stages in seconds",
                &["stage"], // fetch, process
                vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
            )
            .expect("Failed to register avatar_fx_stage_duration_seconds metric");

            let source_bytes = register_histogram!(
                "avatar_fx_source_bytes",
                "Size of fetched source images in bytes",
                prometheus::exponential_buckets(1024.0, 4.0, 8)
                    .expect("valid exponential bucket parameters")
            )
            .expect("Failed to register avatar_fx_source_bytes metric");

            PipelineMetrics {
                renders,
                stage_duration,
                source_bytes,
            }
        })
    }

    pub fn record_render(&self, effect: &str, outcome: &str) {
        self.renders.with_label_values(&[effect, outcome]).inc();
    }

    pub fn record_stage(&self, stage: &str, elapsed: Duration) {
        self.stage_duration
            .with_label_values(&[stage])
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_source_bytes(&self, bytes: usize) {
        self.source_bytes.observe(bytes as f64);
    }

    pub fn render_count(&self, effect: &str, outcome: &str) -> u64 {
        self.renders.with_label_values(&[effect, outcome]).get()
    }
}

/// Render every registered metric in the Prometheus text format.
pub fn export_text() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if encoder.encode(&prometheus::gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
