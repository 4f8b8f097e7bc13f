//! Negotiation boundary between the sequencer and the platform camera API

use crate::constraints::MediaConstraints;
use crate::error::NegotiationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Description of one track carried by a capture handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Track identifier
    pub id: String,
    /// Device label
    pub label: String,
    /// Delivered width in pixels
    pub width: u32,
    /// Delivered height in pixels
    pub height: u32,
    /// Delivered frame rate, when the platform reports one
    pub frame_rate: Option<f64>,
}

/// A live camera stream. Holding one keeps the device locked until [`stop`](CaptureHandle::stop)
/// is called.
pub trait CaptureHandle: Send + Sync {
    /// Tracks of the stream; a usable handle has at least one
    fn tracks(&self) -> Vec<TrackInfo>;

    /// Stop every track and release the device. Calling it twice is harmless.
    fn stop(&mut self);

    /// Whether any track is still running
    fn is_live(&self) -> bool;

    /// Delivered resolution of the first track
    fn resolution(&self) -> Option<(u32, u32)> {
        self.tracks().first().map(|t| (t.width, t.height))
    }
}

/// Turns a constraint record into a live capture handle, or fails with a
/// classified [`NegotiationError`]
#[async_trait]
pub trait Negotiator: Send + Sync {
    /// Handle type produced on success
    type Handle: CaptureHandle + 'static;

    /// Ask the platform for a stream matching `constraints`
    async fn negotiate(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Self::Handle, NegotiationError>;
}
