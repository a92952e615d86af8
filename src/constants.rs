// Constants module - centralized default values for configuration
//
// Effect parameters (factors, radii, cutoffs) are not here: they are part of
// the effect definitions and are not configurable.

// =============================================================================
// Fetcher defaults
// =============================================================================

/// Default total request timeout in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Default TCP/TLS connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default maximum source body size (10 MB)
pub const DEFAULT_MAX_SOURCE_BYTES: u64 = 10 * 1024 * 1024;

/// Default User-Agent sent with source requests
pub const DEFAULT_USER_AGENT: &str = concat!("avatar-fx/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Decoder defaults
// =============================================================================

/// Default maximum decoded pixel count (40 megapixels)
pub const DEFAULT_MAX_PIXELS: u64 = 40_000_000;

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log level when neither config nor RUST_LOG sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Levels accepted in `logging.level`
pub const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
