//! Native camera negotiation via `nokhwa`
//!
//! `nokhwa::Camera` is not `Send`, so each negotiated stream lives on its own
//! worker thread. The handle talks to the worker over a command channel; stopping
//! the handle (or dropping it) ends the thread and releases the device.

use super::{accepts_delivered, select_mode, CaptureDevice, Resolution};
use crate::error::{MediaError, MediaResult};
use crate::tracks::{FrameSource, VideoFrame};
use async_trait::async_trait;
use camscan_core::{
    CaptureHandle, FacingMode, MediaConstraints, NegotiationError, Negotiator, TrackInfo,
};
use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution as NokhwaResolution,
};
use nokhwa::{Camera, NokhwaError};
use std::sync::mpsc;
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Native camera settings
#[derive(Debug, Clone)]
pub struct NativeCameraConfig {
    /// Camera index as enumerated by the platform
    pub index: u32,
    /// Facing direction to assume for the device; desktop platforms do not report one
    pub facing: Option<FacingMode>,
    /// Requested frame rate
    pub frame_rate: u32,
    /// Native modes to negotiate against
    pub modes: Vec<Resolution>,
}

impl Default for NativeCameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            facing: None,
            frame_rate: 30,
            modes: vec![Resolution::VGA, Resolution::HD, Resolution::FULL_HD],
        }
    }
}

/// Negotiator that opens a real camera
#[derive(Debug, Clone, Default)]
pub struct NokhwaNegotiator {
    config: NativeCameraConfig,
}

impl NokhwaNegotiator {
    /// Negotiator for the camera described by `config`
    pub fn new(config: NativeCameraConfig) -> Self {
        Self { config }
    }

    fn device(&self) -> CaptureDevice {
        CaptureDevice {
            id: format!("camera_{}", self.config.index),
            label: format!("Camera {}", self.config.index),
            facing: self.config.facing,
            modes: self.config.modes.clone(),
        }
    }
}

enum Command {
    Grab(mpsc::Sender<MediaResult<VideoFrame>>),
    Stop,
}

/// Classify a `nokhwa` failure into the negotiation taxonomy
pub fn classify_nokhwa_error(error: &NokhwaError) -> NegotiationError {
    let name = match error {
        NokhwaError::OpenDeviceError(..) => "NotReadableError",
        NokhwaError::OpenStreamError(..) => "NotReadableError",
        NokhwaError::SetPropertyError { .. } => "OverconstrainedError",
        NokhwaError::GetPropertyError { .. } => "OverconstrainedError",
        NokhwaError::UnsupportedOperationError(..) => "NotSupportedError",
        _ => "AbortError",
    };
    NegotiationError::from_named(name, error.to_string())
}

#[async_trait]
impl Negotiator for NokhwaNegotiator {
    type Handle = NativeHandle;

    async fn negotiate(&self, constraints: &MediaConstraints) -> Result<NativeHandle, NegotiationError> {
        let target = select_mode(&self.device(), constraints)?;
        let video = constraints.video_constraints().cloned();
        let index = self.config.index;
        let frame_rate = self.config.frame_rate;

        let (ready_tx, ready_rx) = oneshot::channel();
        let (command_tx, command_rx) = mpsc::channel::<Command>();

        let worker = thread::Builder::new()
            .name(format!("camscan-camera-{}", index))
            .spawn(move || {
                let format = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::Closest(
                    CameraFormat::new(
                        NokhwaResolution::new(target.width, target.height),
                        FrameFormat::MJPEG,
                        frame_rate,
                    ),
                ));

                let opened = Camera::new(CameraIndex::Index(index), format).and_then(|mut camera| {
                    camera.open_stream()?;
                    Ok(camera)
                });

                let mut camera = match opened {
                    Ok(camera) => camera,
                    Err(e) => {
                        let _ = ready_tx.send(Err(classify_nokhwa_error(&e)));
                        return;
                    }
                };

                let delivered = camera.resolution();
                let (width, height) = (delivered.width(), delivered.height());
                if let Some(video) = video {
                    if !accepts_delivered(&video, width, height) {
                        let _ = camera.stop_stream();
                        // release the device before the next profile is tried
                        drop(camera);
                        let _ = ready_tx.send(Err(NegotiationError::capability(format!(
                            "device delivered {}x{}",
                            width, height
                        ))));
                        return;
                    }
                }

                let label = camera.info().human_name();
                if ready_tx.send(Ok((label, width, height))).is_err() {
                    let _ = camera.stop_stream();
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        Command::Grab(reply) => {
                            let frame = grab(&mut camera);
                            let lost = frame.is_err() && !camera.is_stream_open();
                            let _ = reply.send(frame);
                            if lost {
                                warn!("Camera {} stream closed by the device", index);
                                break;
                            }
                        }
                        Command::Stop => break,
                    }
                }

                if let Err(e) = camera.stop_stream() {
                    warn!("Failed to stop camera {}: {}", index, e);
                }
                debug!("Camera worker {} exited", index);
            })
            .map_err(|e| NegotiationError::unknown(format!("failed to spawn camera worker: {}", e)))?;

        let ready = ready_rx
            .await
            .map_err(|_| NegotiationError::unknown("camera worker exited before reporting"))
            .and_then(|opened| opened);
        let (label, width, height) = match ready {
            Ok(opened) => opened,
            Err(e) => {
                // the worker has already returned or is about to
                let _ = worker.join();
                return Err(e);
            }
        };

        info!("Opened camera {} ({}) at {}x{}", index, label, width, height);

        Ok(NativeHandle {
            track: TrackInfo {
                id: format!("camera_{}", index),
                label,
                width,
                height,
                frame_rate: Some(frame_rate as f64),
            },
            commands: Some(command_tx),
            worker: Some(worker),
        })
    }
}

fn grab(camera: &mut Camera) -> MediaResult<VideoFrame> {
    let buffer = camera.frame().map_err(|e| MediaError::FrameCapture {
        reason: e.to_string(),
    })?;
    let image = buffer
        .decode_image::<RgbAFormat>()
        .map_err(|e| MediaError::FrameCapture {
            reason: e.to_string(),
        })?;
    let (width, height) = image.dimensions();
    VideoFrame::new(width, height, image.into_raw())
}

/// Stream owned by a camera worker thread
#[derive(Debug)]
pub struct NativeHandle {
    track: TrackInfo,
    commands: Option<mpsc::Sender<Command>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Grab(_) => f.write_str("Grab"),
            Command::Stop => f.write_str("Stop"),
        }
    }
}

impl CaptureHandle for NativeHandle {
    fn tracks(&self) -> Vec<TrackInfo> {
        vec![self.track.clone()]
    }

    /// Blocks until the worker has closed the stream, so the device is free
    /// for the next negotiation when this returns.
    fn stop(&mut self) {
        if let Some(commands) = self.commands.take() {
            let _ = commands.send(Command::Stop);
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Camera worker for {} panicked", self.track.id);
            }
        }
    }

    fn is_live(&self) -> bool {
        self.commands.is_some() && self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }
}

impl FrameSource for NativeHandle {
    fn grab_frame(&mut self) -> MediaResult<VideoFrame> {
        let commands = self.commands.as_ref().ok_or(MediaError::CaptureNotActive)?;
        let (reply_tx, reply_rx) = mpsc::channel();
        commands
            .send(Command::Grab(reply_tx))
            .map_err(|_| MediaError::WorkerDisconnected)?;
        reply_rx.recv().map_err(|_| MediaError::WorkerDisconnected)?
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
