//! Error types for the scanner facade

use camscan_core::CaptureError;
use camscan_media::MediaError;
use thiserror::Error;

/// Main error type for scanner operations
#[derive(Error, Debug)]
pub enum ScanError {
    /// Camera acquisition failed
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Frame extraction failed
    #[error(transparent)]
    Media(#[from] MediaError),

    /// Invalid scanner configuration
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        /// Underlying error
        #[from]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Whether the caller should switch to the non-camera experience
    pub fn requires_fallback_ui(&self) -> bool {
        matches!(self, ScanError::Capture(e) if e.is_terminal())
    }
}

/// Result type alias for scanner operations
pub type ScanResult<T> = Result<T, ScanError>;
