//! # camscan media
//!
//! Capture-side building blocks: device mode selection, a virtual camera for
//! tests and headless runs, an optional native camera backend (`native` feature)
//! and still-frame extraction from live handles.

#![warn(clippy::all)]

pub mod capture;
pub mod error;
pub mod tracks;

// Re-export main types
pub use capture::mock::{MockHandle, MockNegotiator, MockOutcome};
#[cfg(feature = "native")]
pub use capture::native::{NativeCameraConfig, NativeHandle, NokhwaNegotiator};
pub use capture::{accepts_delivered, select_mode, CaptureDevice, Resolution};
pub use error::{ErrorCategory, MediaError, MediaResult};
pub use tracks::{FrameSource, VideoFrame};
