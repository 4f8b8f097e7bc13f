//! Media error types
//!
//! Raised while reading frames from a live capture handle. Negotiation failures
//! never show up here; they are `NegotiationError`s in `camscan-core`.

use thiserror::Error;

/// Errors from frame extraction
#[derive(Error, Debug)]
pub enum MediaError {
    /// Pixel buffer length does not match the frame size
    #[error("Frame buffer holds {actual} bytes, {expected} needed")]
    InvalidFrameData {
        /// Bytes required for width x height RGBA
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// No live handle to read from
    #[error("Camera is not streaming")]
    CaptureNotActive,

    /// The device returned no usable frame
    #[error("Could not read frame: {reason}")]
    FrameCapture {
        /// Backend message
        reason: String,
    },

    /// The thread owning the device is gone
    #[error("Camera worker disconnected")]
    WorkerDisconnected,
}

/// Result type alias for media operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// A retry on the same handle may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MediaError::FrameCapture { .. } | MediaError::InvalidFrameData { .. }
        )
    }

    /// Coarse classification for UI messaging
    pub fn category(&self) -> ErrorCategory {
        match self {
            MediaError::InvalidFrameData { .. } => ErrorCategory::Data,
            MediaError::FrameCapture { .. } => ErrorCategory::Device,
            MediaError::CaptureNotActive | MediaError::WorkerDisconnected => ErrorCategory::State,
        }
    }
}

/// Broad groups of [`MediaError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed pixel data
    Data,
    /// The camera misbehaved
    Device,
    /// Called at the wrong time in the handle lifecycle
    State,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let err = MediaError::FrameCapture {
            reason: "timeout".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Device);
        assert!(err.is_recoverable());

        assert_eq!(MediaError::WorkerDisconnected.category(), ErrorCategory::State);
        assert!(!MediaError::CaptureNotActive.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let error = MediaError::InvalidFrameData {
            expected: 16,
            actual: 15,
        };
        assert_eq!(error.to_string(), "Frame buffer holds 15 bytes, 16 needed");
    }
}
