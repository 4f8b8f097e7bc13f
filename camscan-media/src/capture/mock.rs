//! Virtual camera for tests, demos and headless environments
//!
//! [`MockNegotiator`] models one [`CaptureDevice`] and answers negotiations with
//! [`select_mode`], unless an outcome was queued with
//! [`push_outcome`](MockNegotiator::push_outcome). Every request is recorded and
//! every handed-out handle stays observable, so callers can check that no
//! stream was leaked.

use super::{select_mode, CaptureDevice, Resolution};
use crate::error::{MediaError, MediaResult};
use crate::tracks::{FrameSource, VideoFrame, RGBA_BYTES_PER_PIXEL};
use async_trait::async_trait;
use camscan_core::{
    CaptureHandle, FacingMode, MediaConstraints, NegotiationError, Negotiator, TrackInfo,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Forced result for the next negotiation
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Deliver a stream at this resolution
    Succeed(Resolution),
    /// Fail with this error
    Fail(NegotiationError),
}

#[derive(Debug)]
struct MockState {
    device: CaptureDevice,
    permission_denied: bool,
    script: VecDeque<MockOutcome>,
    calls: Vec<MediaConstraints>,
    handles: Vec<Arc<AtomicBool>>,
}

/// Scripted negotiator backed by a virtual device. Clones share state.
#[derive(Debug, Clone)]
pub struct MockNegotiator {
    state: Arc<Mutex<MockState>>,
}

impl MockNegotiator {
    /// Negotiator for `device`
    pub fn new(device: CaptureDevice) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                device,
                permission_denied: false,
                script: VecDeque::new(),
                calls: Vec::new(),
                handles: Vec::new(),
            })),
        }
    }

    /// Rear-facing phone camera with VGA, HD and Full HD modes
    pub fn rear_camera() -> Self {
        Self::new(CaptureDevice {
            id: "mock_camera_0".to_string(),
            label: "Mock Rear Camera".to_string(),
            facing: Some(FacingMode::Environment),
            modes: vec![Resolution::VGA, Resolution::HD, Resolution::FULL_HD],
        })
    }

    /// Desktop webcam that reports no facing direction
    pub fn webcam() -> Self {
        Self::new(CaptureDevice {
            id: "mock_webcam_0".to_string(),
            label: "Mock Webcam".to_string(),
            facing: None,
            modes: vec![Resolution::VGA, Resolution::new(600, 378), Resolution::HD],
        })
    }

    /// Refuse every request with `NotAllowedError`
    pub fn deny_permission(&self, denied: bool) {
        self.state.lock().permission_denied = denied;
    }

    /// Queue a forced outcome; queued outcomes are consumed before the device
    /// model is consulted
    pub fn push_outcome(&self, outcome: MockOutcome) {
        self.state.lock().script.push_back(outcome);
    }

    /// Queue `count` capability failures
    pub fn fail_next(&self, count: usize) {
        let mut state = self.state.lock();
        for _ in 0..count {
            state
                .script
                .push_back(MockOutcome::Fail(NegotiationError::capability("scripted")));
        }
    }

    /// Every constraint record received, in order
    pub fn calls(&self) -> Vec<MediaConstraints> {
        self.state.lock().calls.clone()
    }

    /// Number of negotiations made
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Handles that have not been stopped
    pub fn live_handles(&self) -> usize {
        self.state
            .lock()
            .handles
            .iter()
            .filter(|live| live.load(Ordering::SeqCst))
            .count()
    }

    fn outcome_for(&self, constraints: &MediaConstraints) -> MockOutcome {
        let mut state = self.state.lock();
        state.calls.push(constraints.clone());

        if let Some(outcome) = state.script.pop_front() {
            return outcome;
        }
        if state.permission_denied {
            return MockOutcome::Fail(NegotiationError::permission("Permission denied"));
        }
        match select_mode(&state.device, constraints) {
            Ok(mode) => MockOutcome::Succeed(mode),
            Err(e) => MockOutcome::Fail(e),
        }
    }
}

#[async_trait]
impl Negotiator for MockNegotiator {
    type Handle = MockHandle;

    async fn negotiate(&self, constraints: &MediaConstraints) -> Result<MockHandle, NegotiationError> {
        match self.outcome_for(constraints) {
            MockOutcome::Succeed(mode) => {
                let live = Arc::new(AtomicBool::new(true));
                let mut state = self.state.lock();
                state.handles.push(live.clone());
                debug!("Mock stream opened at {}x{}", mode.width, mode.height);

                Ok(MockHandle {
                    track: TrackInfo {
                        id: Uuid::new_v4().to_string(),
                        label: state.device.label.clone(),
                        width: mode.width,
                        height: mode.height,
                        frame_rate: Some(30.0),
                    },
                    live,
                    sequence: 0,
                })
            }
            MockOutcome::Fail(e) => {
                debug!("Mock negotiation failed: {}", e);
                Err(e)
            }
        }
    }
}

/// Stream handed out by [`MockNegotiator`]
#[derive(Debug)]
pub struct MockHandle {
    track: TrackInfo,
    live: Arc<AtomicBool>,
    sequence: u64,
}

impl MockHandle {
    /// Track identifier
    pub fn track_id(&self) -> &str {
        &self.track.id
    }
}

impl CaptureHandle for MockHandle {
    fn tracks(&self) -> Vec<TrackInfo> {
        vec![self.track.clone()]
    }

    fn stop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl FrameSource for MockHandle {
    /// Synthetic gradient: red follows x, green follows y, blue the frame sequence
    fn grab_frame(&mut self) -> MediaResult<VideoFrame> {
        if !self.is_live() {
            return Err(MediaError::CaptureNotActive);
        }

        let (width, height) = (self.track.width, self.track.height);
        let mut data = Vec::with_capacity(width as usize * height as usize * RGBA_BYTES_PER_PIXEL);
        let blue = (self.sequence % 256) as u8;
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, blue, 255]);
            }
        }
        self.sequence += 1;

        VideoFrame::new(width, height, data)
    }
}
