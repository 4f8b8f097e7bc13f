//! Camera permission priming
//!
//! Asks for an unconstrained video stream once, releases it immediately and
//! reports whether access is granted. Runs outside the constraint ladder.

use crate::constraints::MediaConstraints;
use crate::error::NegotiationError;
use crate::negotiator::{CaptureHandle, Negotiator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of a permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// A stream was obtained
    Granted,
    /// Access was refused
    Denied,
    /// The check failed for another reason
    Indeterminate,
}

impl PermissionState {
    /// Map a negotiation failure: permission denials are `Denied`, anything else
    /// is `Indeterminate`
    pub fn from_error(error: &NegotiationError) -> Self {
        if error.is_permission() {
            PermissionState::Denied
        } else {
            PermissionState::Indeterminate
        }
    }

    /// `Some(true)` granted, `Some(false)` denied, `None` unknown
    pub fn as_option(&self) -> Option<bool> {
        match self {
            PermissionState::Granted => Some(true),
            PermissionState::Denied => Some(false),
            PermissionState::Indeterminate => None,
        }
    }
}

/// Request `{video: true, audio: false}` and release the stream straight away
pub async fn prime_permission<N>(negotiator: &N) -> PermissionState
where
    N: Negotiator + ?Sized,
{
    match negotiator.negotiate(&MediaConstraints::any_video()).await {
        Ok(mut handle) => {
            handle.stop();
            info!("Camera permission granted");
            PermissionState::Granted
        }
        Err(e) => {
            let state = PermissionState::from_error(&e);
            debug!("Camera permission check failed ({:?}): {}", state, e);
            state
        }
    }
}
