//! # camscan core
//!
//! Capture-constraint profiles, the negotiation boundary and the acquisition
//! sequencer that walks a fixed fallback ladder until a camera stream is obtained.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod constraints;
pub mod error;
pub mod negotiator;
pub mod orientation;
pub mod permission;
pub mod sequencer;

// Re-export main types
pub use constraints::{
    ConstraintProfile, FacingConstraint, FacingMode, IdealValue, MediaConstraints,
    OrientationConstraints, ProfileLadder, ResizeMode, ResolutionSpec, ValueRange,
    VideoConstraints, VideoRequest, DEFAULT_PROFILE,
};
pub use error::{CaptureError, CaptureResult, NegotiationError, NegotiationErrorKind};
pub use negotiator::{CaptureHandle, Negotiator, TrackInfo};
pub use orientation::{Orientation, OrientationSource, SharedOrientation};
pub use permission::{prime_permission, PermissionState};
pub use sequencer::{AcquisitionMetrics, AcquisitionSession, AcquisitionState, Acquired};
