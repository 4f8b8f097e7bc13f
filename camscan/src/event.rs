//! Event system for camera acquisition

use camscan_core::{Orientation, PermissionState};
use futures::Stream;
use serde::Serialize;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

/// Events emitted by a [`CameraController`](crate::CameraController)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraEvent {
    /// A capture handle was obtained and attached to the preview
    Acquired {
        /// Profile that succeeded
        profile: String,
        /// Orientation it was resolved against
        orientation: Orientation,
        /// Negotiation attempts made
        attempts: u32,
    },
    /// The stream was re-opened with the locked profile after a rotation
    Reacquired {
        /// Locked profile
        profile: String,
        /// New orientation
        orientation: Orientation,
    },
    /// No profile produced a handle; the caller should switch to the
    /// non-camera experience
    Exhausted {
        /// Negotiation attempts made
        attempts: u32,
    },
    /// Result of a permission check
    Permission {
        /// Permission outcome
        state: PermissionState,
    },
    /// The held handle was stopped
    Stopped,
}

impl CameraEvent {
    /// Short snake_case name, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            CameraEvent::Acquired { .. } => "acquired",
            CameraEvent::Reacquired { .. } => "reacquired",
            CameraEvent::Exhausted { .. } => "exhausted",
            CameraEvent::Permission { .. } => "permission",
            CameraEvent::Stopped => "stopped",
        }
    }

    /// Check if this event changes whether a handle is held
    pub fn is_capture_event(&self) -> bool {
        matches!(
            self,
            CameraEvent::Acquired { .. }
                | CameraEvent::Reacquired { .. }
                | CameraEvent::Exhausted { .. }
                | CameraEvent::Stopped
        )
    }
}

/// Stream of camera events for async iteration
#[derive(Debug)]
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<CameraEvent>,
}

impl EventStream {
    /// Wrap the receiving half of a controller subscription
    pub fn new(receiver: mpsc::UnboundedReceiver<CameraEvent>) -> Self {
        Self { receiver }
    }

    /// Wait for the next camera event; `None` once the controller is gone
    pub async fn next(&mut self) -> Option<CameraEvent> {
        self.receiver.recv().await
    }

    /// Next queued event, if any
    pub fn try_next(&mut self) -> Option<CameraEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drain every event currently queued
    pub fn drain(&mut self) -> Vec<CameraEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Stop receiving; the controller drops this subscriber on its next emit
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

impl Stream for EventStream {
    type Item = CameraEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Runs a callback for every camera event on a background task
#[derive(Debug)]
pub struct EventHandler {
    event_tx: mpsc::UnboundedSender<CameraEvent>,
    _worker: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    /// Spawn a task that feeds every event to `callback`. Must be called from
    /// within a tokio runtime.
    pub fn new<F>(mut callback: F) -> Self
    where
        F: FnMut(CameraEvent) + Send + 'static,
    {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<CameraEvent>();

        let worker = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                debug!("Processing camera event: {}", event.event_type());
                callback(event);
            }
        });

        Self {
            event_tx,
            _worker: worker,
        }
    }

    /// Sender to register with a controller
    pub fn sender(&self) -> mpsc::UnboundedSender<CameraEvent> {
        self.event_tx.clone()
    }
}
