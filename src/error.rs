// Error types module

use thiserror::Error;

/// Failure retrieving the source image.
///
/// These are the only errors a caller may reasonably retry; see
/// [`FetchError::is_retryable`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// URL is not an absolute http(s) URL
    #[error("Invalid source URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Remote endpoint answered with a non-success status
    #[error("Source returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Connection failed or the body could not be read
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The bounded wait on the remote call elapsed
    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    /// Body exceeds the configured size limit
    #[error("Source body of {size} bytes exceeds limit of {max_size} bytes")]
    TooLarge { size: u64, max_size: u64 },

    /// The HTTP client could not be constructed (TLS backend, resolver)
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Whether a caller-side retry could plausibly succeed.
    ///
    /// - Network failures and timeouts → retryable
    /// - 429 and 5xx statuses → retryable
    /// - Everything else (bad URL, 4xx, oversize body, client setup) → not retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network { .. } | FetchError::Timeout { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::InvalidUrl { .. }
            | FetchError::TooLarge { .. }
            | FetchError::Client(_) => false,
        }
    }

    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        FetchError::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        FetchError::Network {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Failure turning raw bytes into a pixel buffer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Bytes do not match any known raster signature
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Format was recognized but the data is corrupt or empty
    #[error("Malformed image data: {0}")]
    Malformed(String),

    /// Header dimensions exceed the decode limit (image bomb protection)
    #[error("Image dimensions {width}x{height} ({pixels} pixels) exceed limit of {max_pixels} pixels")]
    TooManyPixels {
        width: u32,
        height: u32,
        pixels: u64,
        max_pixels: u64,
    },
}

impl DecodeError {
    pub fn too_many_pixels(width: u32, height: u32, max_pixels: u64) -> Self {
        DecodeError::TooManyPixels {
            width,
            height,
            pixels: width as u64 * height as u64,
            max_pixels,
        }
    }
}

/// The requested effect is not in the registry.
///
/// Callers are expected to only pass validated identifiers, so this is a
/// contract violation rather than a user error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown effect: '{name}'")]
pub struct UnknownEffectError {
    pub name: String,
}

impl UnknownEffectError {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Encoding a well-formed buffer failed. Indicates an upstream invariant
/// violation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to encode {format}: {message}")]
pub struct EncodeError {
    pub format: &'static str,
    pub message: String,
}

impl EncodeError {
    pub fn new(format: &'static str, message: impl Into<String>) -> Self {
        Self {
            format,
            message: message.into(),
        }
    }
}

/// Loading or validating configuration failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(String),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Everything a pipeline invocation can fail with.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    UnknownEffect(#[from] UnknownEffectError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Caller-imposed wall-clock budget elapsed; in-flight work was discarded
    #[error("Render exceeded budget of {budget_ms}ms")]
    DeadlineExceeded { budget_ms: u64 },

    /// The blocking worker panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl PipelineError {
    /// Whether retrying the whole render could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Fetch(e) => e.is_retryable(),
            PipelineError::DeadlineExceeded { .. } => true,
            PipelineError::Decode(_)
            | PipelineError::UnknownEffect(_)
            | PipelineError::Encode(_)
            | PipelineError::Worker(_) => false,
        }
    }

    /// Internal faults (contract violations, broken invariants) as opposed to
    /// problems with the user's input or the remote source.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            PipelineError::UnknownEffect(_) | PipelineError::Encode(_) | PipelineError::Worker(_)
        )
    }

    /// Short stage label used for metrics and logs.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Fetch(_) => "fetch",
            PipelineError::Decode(_) => "decode",
            PipelineError::UnknownEffect(_) => "effect",
            PipelineError::Encode(_) => "encode",
            PipelineError::DeadlineExceeded { .. } => "deadline",
            PipelineError::Worker(_) => "worker",
        }
    }
}
