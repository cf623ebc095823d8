//! Error types for the meme generator

use thiserror::Error;

/// Result type alias for meme generator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, composing or publishing a meme
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to fetch or read an image source
    #[error("Failed to load image: {0}")]
    LoadError(String),

    /// The image bytes could not be decoded
    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    /// Failed to produce or encode a raster
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Transport-level failure talking to the backend
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The backend answered but reported a failure
    #[error("API error: {0}")]
    ApiError(String),

    /// A file offered for upload is not an image
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    /// API-based creation needs a selected template
    #[error("No template selected")]
    MissingTemplate,

    /// A meme creation request is already pending
    #[error("A meme creation request is already in flight")]
    SubmissionInFlight,

    /// A user-supplied value was rejected (color, position, etc.)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::DecodeError(err.to_string())
    }
}

#[cfg(feature = "api")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}
