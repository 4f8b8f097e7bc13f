//! Camera controller: owns the single live capture handle

use crate::config::ScannerConfig;
use crate::error::{ScanError, ScanResult};
use crate::event::{CameraEvent, EventHandler, EventStream};
use camscan_core::{
    prime_permission, AcquisitionSession, Acquired, CaptureError, CaptureHandle, Negotiator,
    OrientationSource, PermissionState, ProfileLadder,
};
use camscan_media::{FrameSource, MediaError, VideoFrame};
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Where the live stream is shown
///
/// Attaching is plain assignment; the sink must not stop the handle.
pub trait PreviewSink<H>: Send {
    /// Show `handle`
    fn attach(&mut self, handle: &H);

    /// Clear the preview
    fn detach(&mut self);
}

/// Fluent builder for [`CameraController`]
pub struct CameraControllerBuilder<N: Negotiator, O> {
    negotiator: N,
    orientation: O,
    config: ScannerConfig,
    preview: Option<Box<dyn PreviewSink<N::Handle>>>,
    subscribers: Vec<mpsc::UnboundedSender<CameraEvent>>,
}

impl<N, O> CameraControllerBuilder<N, O>
where
    N: Negotiator,
    O: OrientationSource,
{
    /// Use this configuration
    pub fn config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the profile ladder
    pub fn ladder(mut self, ladder: ProfileLadder) -> Self {
        self.config.ladder = ladder;
        self
    }

    /// Attach acquired streams to this preview
    pub fn preview(mut self, sink: impl PreviewSink<N::Handle> + 'static) -> Self {
        self.preview = Some(Box::new(sink));
        self
    }

    /// Deliver every event to a callback handler
    pub fn event_handler(mut self, handler: &EventHandler) -> Self {
        self.subscribers.push(handler.sender());
        self
    }

    /// Validate configuration and build the controller
    pub fn build(self) -> ScanResult<CameraController<N, O>> {
        self.config.validate()?;

        Ok(CameraController {
            negotiator: self.negotiator,
            orientation: self.orientation,
            config: self.config,
            session: AcquisitionSession::new(),
            handle: None,
            preview: self.preview,
            subscribers: self.subscribers,
            fallback_ui: false,
        })
    }
}

/// Drives acquisition, preview wiring and re-acquisition on rotation.
///
/// Holds at most one capture handle. Every method that negotiates takes
/// `&mut self`, so a new acquisition cannot begin before the previous one
/// settles.
pub struct CameraController<N: Negotiator, O> {
    negotiator: N,
    orientation: O,
    config: ScannerConfig,
    session: AcquisitionSession,
    handle: Option<N::Handle>,
    preview: Option<Box<dyn PreviewSink<N::Handle>>>,
    subscribers: Vec<mpsc::UnboundedSender<CameraEvent>>,
    fallback_ui: bool,
}

impl<N, O> CameraController<N, O>
where
    N: Negotiator,
    O: OrientationSource,
{
    /// Start building a controller around `negotiator`
    ///
    /// # Example
    /// ```rust,no_run
    /// use camscan::{CameraController, MockNegotiator, SharedOrientation};
    ///
    /// # async fn example() -> camscan::ScanResult<()> {
    /// let mut camera = CameraController::builder(MockNegotiator::rear_camera(), SharedOrientation::default())
    ///     .build()?;
    /// let mut events = camera.subscribe();
    /// camera.start().await?;
    /// println!("{:?}", events.next().await);
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder(negotiator: N, orientation: O) -> CameraControllerBuilder<N, O> {
        CameraControllerBuilder {
            negotiator,
            orientation,
            config: ScannerConfig::default(),
            preview: None,
            subscribers: Vec::new(),
        }
    }

    /// Controller with default configuration
    pub fn new(negotiator: N, orientation: O) -> Self {
        Self {
            negotiator,
            orientation,
            config: ScannerConfig::default(),
            session: AcquisitionSession::new(),
            handle: None,
            preview: None,
            subscribers: Vec::new(),
            fallback_ui: false,
        }
    }

    /// Acquire the camera, walking the ladder unless a profile is already locked.
    ///
    /// Any held handle is stopped first. On a terminal failure exactly one
    /// [`CameraEvent::Exhausted`] is emitted and the fallback UI flag is set.
    pub async fn start(&mut self) -> ScanResult<()> {
        self.session.begin();
        self.release_handle();

        let result = self
            .session
            .acquire(&self.config.ladder, &self.orientation, &self.negotiator)
            .await;

        match result {
            Ok(Acquired {
                handle,
                profile,
                orientation,
                attempts,
            }) => {
                self.install(handle);
                self.emit(CameraEvent::Acquired {
                    profile,
                    orientation,
                    attempts,
                });
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Stop and drop the held handle. No-op when idle.
    pub fn stop(&mut self) {
        if self.release_handle() {
            info!("Camera stopped");
            self.emit(CameraEvent::Stopped);
        }
    }

    /// Re-open the stream for the current orientation with the locked profile.
    ///
    /// Does nothing when no handle is held. The ladder is never restarted: if
    /// the locked profile fails the failure is terminal.
    pub async fn on_orientation_change(&mut self) -> ScanResult<()> {
        if self.handle.is_none() {
            debug!("Orientation changed with no active camera");
            return Ok(());
        }
        if !self.config.reacquire_on_orientation_change {
            debug!("Orientation re-acquisition disabled");
            return Ok(());
        }

        self.release_handle();
        self.session.begin();

        let result = self
            .session
            .acquire(&self.config.ladder, &self.orientation, &self.negotiator)
            .await;

        match result {
            Ok(acquired) => {
                info!(
                    "Camera re-acquired in {} with '{}' profile",
                    acquired.orientation, acquired.profile
                );
                self.install(acquired.handle);
                self.emit(CameraEvent::Reacquired {
                    profile: acquired.profile,
                    orientation: acquired.orientation,
                });
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Check camera permission outside the ladder.
    ///
    /// While a handle is held access is known to be granted and no second
    /// stream is opened.
    pub async fn request_permission(&mut self) -> PermissionState {
        let state = match &self.handle {
            Some(handle) if handle.is_live() => PermissionState::Granted,
            _ => prime_permission(&self.negotiator).await,
        };
        self.emit(CameraEvent::Permission { state });
        state
    }

    /// Subscribe to controller events
    pub fn subscribe(&mut self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        EventStream::new(rx)
    }

    /// Forget the locked profile so the next [`start`](Self::start) walks the
    /// whole ladder again. The held handle, if any, keeps streaming.
    pub fn reset_profile(&mut self) {
        if let Some(profile) = self.session.locked_profile() {
            info!("Releasing locked profile '{}'", profile);
        }
        self.session.clear_lock();
    }

    /// Whether a handle is held
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// The held handle
    pub fn handle(&self) -> Option<&N::Handle> {
        self.handle.as_ref()
    }

    /// Acquisition session state
    pub fn session(&self) -> &AcquisitionSession {
        &self.session
    }

    /// Active configuration
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Whether the caller should show the non-camera experience
    pub fn is_fallback_ui(&self) -> bool {
        self.fallback_ui
    }

    /// Set or clear the fallback UI flag
    pub fn set_fallback_ui(&mut self, enabled: bool) {
        self.fallback_ui = enabled;
    }

    fn install(&mut self, handle: N::Handle) {
        if let Some(preview) = self.preview.as_mut() {
            preview.attach(&handle);
        }
        self.handle = Some(handle);
    }

    fn release_handle(&mut self) -> bool {
        let Some(mut handle) = self.handle.take() else {
            return false;
        };
        handle.stop();
        if let Some(preview) = self.preview.as_mut() {
            preview.detach();
        }
        true
    }

    fn fail(&mut self, error: CaptureError) -> ScanError {
        if error.is_terminal() {
            warn!("Camera unavailable, switching to fallback UI: {}", error);
            self.fallback_ui = true;
            self.emit(CameraEvent::Exhausted {
                attempts: self.session.attempt_count(),
            });
        }
        error.into()
    }

    fn emit(&mut self, event: CameraEvent) {
        debug!("Emitting camera event: {}", event.event_type());
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl<N, O> CameraController<N, O>
where
    N: Negotiator,
    N::Handle: FrameSource,
    O: OrientationSource,
{
    /// Copy the frame currently on screen
    pub fn take_snapshot(&mut self) -> ScanResult<VideoFrame> {
        let handle = self.handle.as_mut().ok_or(MediaError::CaptureNotActive)?;
        Ok(handle.grab_frame()?)
    }
}

impl<N: Negotiator, O> fmt::Debug for CameraController<N, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraController")
            .field("session", &self.session)
            .field("active", &self.handle.is_some())
            .field("fallback_ui", &self.fallback_ui)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl<N: Negotiator, O> Drop for CameraController<N, O> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
        }
    }
}
