// End-to-end renders: HTTP source -> PNG output

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use avatar_fx::config::Config;
use avatar_fx::decoder::{ImageDecoder, RasterDecoder};
use avatar_fx::effects::PixelBuffer;
use avatar_fx::error::{DecodeError, FetchError, PipelineError};
use avatar_fx::fetcher::HttpFetcher;
use avatar_fx::{EffectId, EffectPipeline};
use rstest::rstest;

use super::test_harness::{jpeg, png_rgb, png_rgba, MockSource, Route};

/// Decoder wrapper that counts calls
struct CountingDecoder {
    inner: RasterDecoder,
    calls: Arc<AtomicUsize>,
}

impl ImageDecoder for CountingDecoder {
    fn decode(&self, raw: &[u8]) -> Result<PixelBuffer, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.decode(raw)
    }
}

fn default_pipeline() -> EffectPipeline {
    EffectPipeline::from_config(&Config::default()).expect("Failed to build pipeline")
}

#[tokio::test]
async fn test_grayscale_256_png() {
    let source = MockSource::start(vec![("/avatar.png", Route::ok(png_rgb(256, 256)))]).await;
    let rendered = default_pipeline()
        .render(&source.url("/avatar.png"), EffectId::Grayscale)
        .await
        .unwrap();

    assert_eq!(rendered.content_type, "image/png");
    assert_eq!(rendered.content_length(), rendered.data.len());
    assert!(rendered.content_length() > 0);

    let decoded = image::load_from_memory(&rendered.data).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (256, 256));
    assert!(decoded.pixels().all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2]));
}

#[tokio::test]
async fn test_404_never_reaches_decoder() {
    let source = MockSource::start(vec![]).await;
    let calls = Arc::new(AtomicUsize::new(0));
    let decoder = CountingDecoder {
        inner: RasterDecoder::default(),
        calls: Arc::clone(&calls),
    };
    let fetcher = HttpFetcher::new(&Config::default().fetcher).unwrap();
    let pipeline = EffectPipeline::new(fetcher, decoder);

    let err = pipeline
        .render(&source.url("/missing.png"), EffectId::Sepia)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Fetch(FetchError::Status { status: 404, .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[case::none(EffectId::None)]
#[case::blur(EffectId::Blur)]
#[case::emboss(EffectId::Emboss)]
#[case::sepia(EffectId::Sepia)]
#[case::saturate(EffectId::Saturate)]
#[tokio::test]
async fn test_jpeg_source_renders_as_png(#[case] effect: EffectId) {
    let source = MockSource::start(vec![("/a.jpg", Route::ok(jpeg(40, 30)))]).await;
    let rendered = default_pipeline()
        .render(&source.url("/a.jpg"), effect)
        .await
        .unwrap();
    assert_eq!(&rendered.data[..4], b"\x89PNG");
    assert_eq!(rendered.dimensions(), (40, 30));
    assert_eq!(rendered.effect, effect);
}

#[tokio::test]
async fn test_transparent_source_renders_white() {
    let source = MockSource::start(vec![("/ghost.png", Route::ok(png_rgba(6, 6, 0)))]).await;
    let rendered = default_pipeline()
        .render(&source.url("/ghost.png"), EffectId::None)
        .await
        .unwrap();
    let decoded = image::load_from_memory(&rendered.data).unwrap().to_rgb8();
    assert!(decoded.pixels().all(|p| p.0 == [255, 255, 255]));
}

#[tokio::test]
async fn test_pro_enhance_outputs_512_square() {
    let source = MockSource::start(vec![("/a.png", Route::ok(png_rgb(96, 128)))]).await;
    let rendered = default_pipeline()
        .render_named(&source.url("/a.png"), "pro_enhance")
        .await
        .unwrap();
    assert_eq!(rendered.dimensions(), (512, 512));
    assert_eq!(rendered.file_name(), "avatar_pro_enhance.png");
}

#[tokio::test]
async fn test_html_body_is_decode_error() {
    let source = MockSource::start(vec![(
        "/page",
        Route::ok(b"<html><body>not an avatar</body></html>".to_vec()),
    )])
    .await;
    let err = default_pipeline()
        .render(&source.url("/page"), EffectId::Blur)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Decode(DecodeError::UnsupportedFormat(_))
    ));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_render_within_budget_exceeded() {
    let source = MockSource::start(vec![(
        "/slow.png",
        Route::ok(png_rgb(4, 4)).delayed(Duration::from_secs(2)),
    )])
    .await;
    let err = default_pipeline()
        .render_within(
            &source.url("/slow.png"),
            EffectId::Invert,
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
    assert_eq!(err, PipelineError::DeadlineExceeded { budget_ms: 100 });
}

#[tokio::test]
async fn test_concurrent_renders_share_one_pipeline() {
    let source = MockSource::start(vec![("/a.png", Route::ok(png_rgb(32, 32)))]).await;
    let pipeline = Arc::new(default_pipeline());
    let url = source.url("/a.png");

    let handles: Vec<_> = [EffectId::Blur, EffectId::Invert, EffectId::Sharpen, EffectId::Darken]
        .into_iter()
        .map(|effect| {
            let pipeline = Arc::clone(&pipeline);
            let url = url.clone();
            tokio::spawn(async move { pipeline.render(&url, effect).await })
        })
        .collect();

    for handle in handles {
        let rendered = handle.await.unwrap().unwrap();
        assert_eq!(rendered.dimensions(), (32, 32));
    }
    assert_eq!(source.hits(), 4);
}
