//! Common constants used throughout stencil.

/// Suffixes recognized when `templateFileExtension` is `true`
pub const DEFAULT_TEMPLATE_EXTENSIONS: [&str; 2] = [".njk", ".j2"];

/// Number of leading bytes inspected by the binary check
pub const BINARY_SAMPLE_SIZE: usize = 512;

/// Share of suspicious bytes above which a sample is considered binary
pub const SUSPICIOUS_BYTES_RATIO: f64 = 0.1;

/// Target path used when the input does not name one
pub const DEFAULT_TARGET_PATH: &str = "./";

/// Prefix of the staging directories created for each run
pub const STAGING_PREFIX: &str = "stencil-";
