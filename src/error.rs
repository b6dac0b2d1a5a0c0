//! Error types for the overlay tool

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for overlay operations
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Errors that can occur while loading images, fetching the overlay
/// layer, or persisting presets
#[derive(Error, Debug)]
pub enum OverlayError {
    /// Reading or writing a file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes could not be decoded as an image
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The overlay URL could not be fetched
    #[error("Failed to fetch overlay: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Headless Chrome could not render the overlay page
    #[error("Failed to render overlay page: {0}")]
    Render(String),

    /// The server answered with a non-success status
    #[error("Overlay server answered {0}")]
    HttpStatus(u16),

    /// The overlay URL uses a scheme we cannot render
    #[error("Unsupported overlay URL: {0}")]
    UnsupportedUrl(String),

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// No per-user data or config directory exists on this system
    #[error("Could not determine the user data directory")]
    NoDataDir,

    /// A blocking worker task panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl OverlayError {
    /// Attach a path to an I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OverlayError::Io {
            path: path.into(),
            source,
        }
    }
}
