//! # camscan - camera acquisition for document scanning
//!
//! Opens a camera stream for a card or document scanner by walking a fixed
//! ladder of capture-constraint profiles, from the preferred rear-camera
//! resolution down to a small exact fallback. The first profile that works is
//! locked for the rest of the session and reused when the device rotates.
//!
//! ## Key Features
//!
//! - **Fallback ladder**: four ordered profiles, each with portrait and landscape halves
//! - **Profile locking**: rotation re-opens the stream without re-exploring the ladder
//! - **Permission priming**: granted / denied / indeterminate, independent of the ladder
//! - **Degraded mode**: a single `Exhausted` event tells the UI to drop the camera
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use camscan::{CameraController, MockNegotiator, Orientation, SharedOrientation};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     camscan::init_logging("info")?;
//!
//!     let orientation = SharedOrientation::new(Orientation::Portrait);
//!     let mut camera = CameraController::builder(MockNegotiator::rear_camera(), orientation.clone())
//!         .build()?;
//!     let mut events = camera.subscribe();
//!
//!     camera.start().await?;
//!     println!("Camera event: {:?}", events.next().await);
//!
//!     orientation.set(Orientation::Landscape);
//!     camera.on_orientation_change().await?;
//!
//!     let frame = camera.take_snapshot()?;
//!     println!("Snapshot {}x{}", frame.width, frame.height);
//!
//!     camera.stop();
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use camscan_core::{
    prime_permission, AcquisitionMetrics, AcquisitionSession, AcquisitionState, Acquired,
    CaptureError, CaptureHandle, CaptureResult, ConstraintProfile, FacingMode, MediaConstraints,
    NegotiationError, NegotiationErrorKind, Negotiator, Orientation, OrientationSource,
    PermissionState, ProfileLadder, ResolutionSpec, SharedOrientation, TrackInfo,
    VideoConstraints, DEFAULT_PROFILE,
};

pub use camscan_media::{
    select_mode, CaptureDevice, FrameSource, MediaError, MockHandle, MockNegotiator, MockOutcome,
    Resolution, VideoFrame,
};

#[cfg(feature = "native")]
pub use camscan_media::{NativeCameraConfig, NativeHandle, NokhwaNegotiator};

// Public API modules
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod logging;

// Re-export main API types
pub use config::ScannerConfig;
pub use controller::{CameraController, CameraControllerBuilder, PreviewSink};
pub use error::{ScanError, ScanResult};
pub use event::{CameraEvent, EventHandler, EventStream};
pub use logging::init_logging;
