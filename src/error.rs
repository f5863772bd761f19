use thiserror::Error;

pub type Result<T> = std::result::Result<T, MatchError>;

#[derive(Debug, Error)]
pub enum MatchError {
    /// A region with no pixels, or no interior pixels for the neighbourhood analyzers.
    #[error("empty region: {width}x{height}")]
    EmptyRegion { width: u32, height: u32 },

    /// Two descriptors that cannot be paired up.
    #[error("descriptor mismatch: {0}")]
    DescriptorMismatch(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid perceptual hash '{0}': expected 16 hex digits")]
    InvalidHash(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
