use crate::models::ECLevel;
use thiserror::Error;

/// Failures while turning a request into a symbol
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// No version up to 40 holds the payload at the requested level
    #[error("payload needs {needed_bits} bits, more than any version holds at level {ec_level}")]
    PayloadTooLarge {
        /// Encoded payload length in bits
        needed_bits: usize,
        /// Level that was requested
        ec_level: ECLevel,
    },
    /// Contradictory or out-of-range request fields
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Failures while reading a symbol from an image
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No symbol was located
    #[error("no QR code found")]
    NotFound,
    /// More errors than the level can correct
    #[error("too many errors to correct (block {block})")]
    Uncorrectable {
        /// Index of the first block that failed
        block: usize,
    },
    /// Format or version bits failed their own check
    #[error("format or version information is unreadable")]
    MalformedFormatInfo,
    /// The time budget ran out before a symbol was read
    #[error("scan time budget exceeded")]
    Timeout,
}

/// Invalid style settings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    /// Not `#RGB` or `#RRGGBB`
    #[error("invalid color '{0}', expected #RGB or #RRGGBB")]
    InvalidColor(String),
    /// Bad gradient stops
    #[error("invalid gradient: {0}")]
    InvalidGradient(String),
    /// Coverage threshold outside 0..1
    #[error("logo coverage threshold {0} outside 0..1")]
    InvalidThreshold(f32),
}

/// Failures while rasterizing a symbol
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// `pixels_per_module` was zero
    #[error("module size must be at least one pixel")]
    ZeroModuleSize,
    /// Style did not validate
    #[error(transparent)]
    Style(#[from] StyleError),
    /// Output would exceed the largest supported image side
    #[error("rendered image side {0} px is too large")]
    TooLarge(u64),
}

/// Why a single batch item failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ItemError {
    /// Encoding failed
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// Rendering failed
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Decoding failed
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The input image could not be loaded
    #[error("image error: {0}")]
    Image(String),
    /// Stopped at a checkpoint after the batch was cancelled
    #[error("cancelled")]
    Cancelled,
    /// Exceeded the per-item time limit
    #[error("timed out")]
    Timeout,
    /// The item processor panicked
    #[error("processor panicked: {0}")]
    Panicked(String),
    /// The processor does not handle this kind of work item
    #[error("unsupported work item: {0}")]
    Unsupported(&'static str),
}

impl From<image::ImageError> for ItemError {
    fn from(err: image::ImageError) -> Self {
        ItemError::Image(err.to_string())
    }
}

/// Batch coordinator errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    /// An item failed; stored in that item's slot, never raised from `submit`
    #[error("item {0} failed: {1}")]
    ItemFailed(usize, ItemError),
    /// Concurrency limit of zero
    #[error("concurrency limit must be at least 1")]
    InvalidConcurrency,
    /// No job with this id
    #[error("unknown job {0}")]
    UnknownJob(u64),
    /// The worker pool could not be created
    #[error("worker pool error: {0}")]
    Pool(String),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value parsed but is out of range
    #[error("invalid config value: {0}")]
    Invalid(String),
}
