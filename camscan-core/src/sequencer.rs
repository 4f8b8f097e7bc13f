//! Camera acquisition sequencer
//!
//! Walks the [`ProfileLadder`] strictly in order, one negotiation at a time, and
//! remembers the first profile that succeeds. Once a profile is locked every later
//! acquisition in the session uses it directly and never revisits the ladder.

use crate::constraints::{ConstraintProfile, ProfileLadder};
use crate::error::{CaptureError, CaptureResult, NegotiationError};
use crate::negotiator::{CaptureHandle, Negotiator};
use crate::orientation::{Orientation, OrientationSource};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where the sequencer currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionState {
    /// No acquisition has run since the session began
    Idle,
    /// Negotiating the profile at this ladder index
    Trying(usize),
    /// A handle was obtained with this profile
    Succeeded(String),
    /// No profile produced a handle
    Exhausted,
}

/// Counters kept across the lifetime of a session
#[derive(Debug, Clone, Default)]
pub struct AcquisitionMetrics {
    /// Negotiation calls made
    pub attempts: u32,
    /// Negotiations that produced a handle
    pub successes: u32,
    /// Failed negotiations by profile name
    pub failures: HashMap<String, u32>,
    /// When the last negotiation started
    pub last_attempt: Option<Instant>,
}

/// Successful acquisition
#[derive(Debug)]
pub struct Acquired<H> {
    /// The live handle
    pub handle: H,
    /// Profile that produced it
    pub profile: String,
    /// Orientation the profile was resolved against
    pub orientation: Orientation,
    /// Attempts made since the session began
    pub attempts: u32,
}

/// Per-session acquisition state
///
/// Created when the camera is started. Callers must not start a second
/// acquisition before the previous one settles; `&mut self` on
/// [`acquire`](AcquisitionSession::acquire) enforces this for a single owner.
#[derive(Debug)]
pub struct AcquisitionSession {
    id: Uuid,
    attempt_count: u32,
    locked_profile: Option<String>,
    state: AcquisitionState,
    metrics: AcquisitionMetrics,
}

impl AcquisitionSession {
    /// Fresh session with no locked profile
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            attempt_count: 0,
            locked_profile: None,
            state: AcquisitionState::Idle,
            metrics: AcquisitionMetrics::default(),
        }
    }

    /// Return to `Idle` for a new start. The locked profile survives.
    pub fn begin(&mut self) {
        debug!("Session {} starting, locked profile: {:?}", self.id, self.locked_profile);
        self.attempt_count = 0;
        self.state = AcquisitionState::Idle;
    }

    /// Session identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Attempts made by the latest [`acquire`](Self::acquire)
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Profile remembered after the first success
    pub fn locked_profile(&self) -> Option<&str> {
        self.locked_profile.as_deref()
    }

    /// Current sequencer state
    pub fn state(&self) -> &AcquisitionState {
        &self.state
    }

    /// Session counters
    pub fn metrics(&self) -> &AcquisitionMetrics {
        &self.metrics
    }

    /// Forget the locked profile so the next acquisition walks the ladder again
    pub fn clear_lock(&mut self) {
        self.locked_profile = None;
    }

    /// Acquire a capture handle.
    ///
    /// With a locked profile only that profile is negotiated and its failure is
    /// terminal. Otherwise profiles are tried in ladder order until one succeeds;
    /// exhausting the ladder returns [`CaptureError::Exhausted`].
    pub async fn acquire<N, O>(
        &mut self,
        ladder: &ProfileLadder,
        orientation: &O,
        negotiator: &N,
    ) -> CaptureResult<Acquired<N::Handle>>
    where
        N: Negotiator + ?Sized,
        O: OrientationSource + ?Sized,
    {
        self.attempt_count = 0;

        if let Some(locked) = self.locked_profile.clone() {
            let (index, profile) = ladder
                .iter()
                .enumerate()
                .find(|(_, p)| p.name == locked)
                .ok_or_else(|| CaptureError::UnknownProfile {
                    name: locked.clone(),
                })?;

            self.state = AcquisitionState::Trying(index);
            return match self.attempt(profile, orientation, negotiator).await {
                Ok(acquired) => Ok(acquired),
                Err(source) => {
                    warn!("Locked profile '{}' failed: {}", locked, source);
                    self.state = AcquisitionState::Exhausted;
                    Err(CaptureError::LockedProfileFailed {
                        profile: locked,
                        source,
                    })
                }
            };
        }

        info!("Acquiring camera with {} fallback profiles", ladder.len());

        let mut last = None;
        for (index, profile) in ladder.iter().enumerate() {
            self.state = AcquisitionState::Trying(index);

            match self.attempt(profile, orientation, negotiator).await {
                Ok(acquired) => {
                    self.locked_profile = Some(profile.name.clone());
                    return Ok(acquired);
                }
                Err(e) => {
                    match ladder.get(index + 1) {
                        Some(next) => warn!(
                            "Camera could not start with '{}' profile, trying '{}': {}",
                            profile.name, next.name, e
                        ),
                        None => warn!(
                            "Camera could not start with '{}' profile, no profiles left: {}",
                            profile.name, e
                        ),
                    }
                    last = Some(e);
                }
            }
        }

        self.state = AcquisitionState::Exhausted;
        Err(CaptureError::Exhausted {
            attempts: self.attempt_count,
            last,
        })
    }

    /// Negotiate a single profile
    async fn attempt<N, O>(
        &mut self,
        profile: &ConstraintProfile,
        orientation: &O,
        negotiator: &N,
    ) -> Result<Acquired<N::Handle>, NegotiationError>
    where
        N: Negotiator + ?Sized,
        O: OrientationSource + ?Sized,
    {
        self.attempt_count += 1;
        self.metrics.attempts += 1;
        self.metrics.last_attempt = Some(Instant::now());

        let orientation = orientation.orientation();
        let constraints = profile.resolve(orientation).to_media_constraints();
        debug!(
            "Attempt {}: profile '{}' ({}) {}",
            self.attempt_count,
            profile.name,
            orientation,
            constraints.to_json()
        );

        let result = match negotiator.negotiate(&constraints).await {
            Ok(mut handle) if handle.tracks().is_empty() => {
                handle.stop();
                Err(NegotiationError::unknown("capture handle has no tracks"))
            }
            other => other,
        };

        match result {
            Ok(handle) => {
                self.metrics.successes += 1;
                self.state = AcquisitionState::Succeeded(profile.name.clone());
                info!(
                    "Camera started with '{}' profile in {} after {} attempt(s)",
                    profile.name, orientation, self.attempt_count
                );
                Ok(Acquired {
                    handle,
                    profile: profile.name.clone(),
                    orientation,
                    attempts: self.attempt_count,
                })
            }
            Err(e) => {
                *self.metrics.failures.entry(profile.name.clone()).or_insert(0) += 1;
                Err(e)
            }
        }
    }
}

impl Default for AcquisitionSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::MediaConstraints;
    use crate::negotiator::TrackInfo;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Debug)]
    struct TestHandle {
        tracks: usize,
        live: bool,
    }

    impl CaptureHandle for TestHandle {
        fn tracks(&self) -> Vec<TrackInfo> {
            (0..self.tracks)
                .map(|i| TrackInfo {
                    id: format!("track-{}", i),
                    label: "test".to_string(),
                    width: 640,
                    height: 480,
                    frame_rate: None,
                })
                .collect()
        }

        fn stop(&mut self) {
            self.live = false;
        }

        fn is_live(&self) -> bool {
            self.live
        }
    }

    /// Succeeds on the call indices in `succeed_on`, fails otherwise
    struct CountingNegotiator {
        succeed_on: Vec<usize>,
        tracks: usize,
        calls: Mutex<Vec<MediaConstraints>>,
    }

    impl CountingNegotiator {
        fn new(succeed_on: Vec<usize>) -> Self {
            Self {
                succeed_on,
                tracks: 1,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Negotiator for CountingNegotiator {
        type Handle = TestHandle;

        async fn negotiate(
            &self,
            constraints: &MediaConstraints,
        ) -> Result<TestHandle, NegotiationError> {
            let mut calls = self.calls.lock();
            let index = calls.len();
            calls.push(constraints.clone());
            if self.succeed_on.contains(&index) {
                Ok(TestHandle {
                    tracks: self.tracks,
                    live: true,
                })
            } else {
                Err(NegotiationError::capability("unsupported"))
            }
        }
    }

    #[tokio::test]
    async fn test_second_profile_locks() {
        let ladder = ProfileLadder::standard();
        let negotiator = CountingNegotiator::new(vec![1]);
        let mut session = AcquisitionSession::new();
        session.begin();

        let acquired = session
            .acquire(&ladder, &Orientation::Portrait, &negotiator)
            .await
            .unwrap();

        assert_eq!(acquired.profile, "second");
        assert_eq!(acquired.attempts, 2);
        assert_eq!(session.locked_profile(), Some("second"));
        assert_eq!(session.state(), &AcquisitionState::Succeeded("second".to_string()));
        assert_eq!(negotiator.calls.lock().len(), 2);
        assert_eq!(session.metrics().failures.get("default"), Some(&1));
    }

    #[tokio::test]
    async fn test_exhaustion() {
        let ladder = ProfileLadder::standard();
        let negotiator = CountingNegotiator::new(vec![]);
        let mut session = AcquisitionSession::new();

        let err = session
            .acquire(&ladder, &Orientation::Landscape, &negotiator)
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Exhausted { attempts: 4, last: Some(_) }));
        assert_eq!(session.state(), &AcquisitionState::Exhausted);
        assert!(session.locked_profile().is_none());
    }

    #[tokio::test]
    async fn test_locked_profile_failure_is_terminal() {
        let ladder = ProfileLadder::standard();
        let mut session = AcquisitionSession::new();

        let first = CountingNegotiator::new(vec![2]);
        session
            .acquire(&ladder, &Orientation::Portrait, &first)
            .await
            .unwrap();
        assert_eq!(session.locked_profile(), Some("third"));

        session.begin();
        let failing = CountingNegotiator::new(vec![]);
        let err = session
            .acquire(&ladder, &Orientation::Portrait, &failing)
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::LockedProfileFailed { ref profile, .. } if profile == "third"));
        assert_eq!(failing.calls.lock().len(), 1);
        assert_eq!(session.attempt_count(), 1);
    }

    #[tokio::test]
    async fn test_trackless_handle_counts_as_failure() {
        let ladder = ProfileLadder::standard();
        let mut negotiator = CountingNegotiator::new(vec![0, 1]);
        negotiator.tracks = 0;
        let mut session = AcquisitionSession::new();

        let err = session
            .acquire(&ladder, &Orientation::Portrait, &negotiator)
            .await
            .unwrap_err();
        assert!(err.is_terminal());
        assert_eq!(negotiator.calls.lock().len(), 4);
    }

    #[tokio::test]
    async fn test_rewalk_after_clear_lock_counts_from_one() {
        let ladder = ProfileLadder::standard();
        let mut session = AcquisitionSession::new();
        session
            .acquire(&ladder, &Orientation::Portrait, &CountingNegotiator::new(vec![1]))
            .await
            .unwrap();
        assert_eq!(session.attempt_count(), 2);

        session.clear_lock();
        let err = session
            .acquire(&ladder, &Orientation::Portrait, &CountingNegotiator::new(vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Exhausted { attempts: 4, .. }));
        assert!(err.to_string().starts_with("All 4 constraint profiles failed"));
        assert_eq!(session.metrics().attempts, 6);
    }

    #[tokio::test]
    async fn test_unknown_locked_profile() {
        let mut session = AcquisitionSession::new();
        let negotiator = CountingNegotiator::new(vec![0]);
        let ladder = ProfileLadder::standard();
        session
            .acquire(&ladder, &Orientation::Portrait, &negotiator)
            .await
            .unwrap();

        let other = ProfileLadder::new(vec![ladder.get(3).unwrap().clone()]).unwrap();
        let err = session
            .acquire(&other, &Orientation::Portrait, &negotiator)
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::UnknownProfile { ref name } if name == "default"));
    }
}
