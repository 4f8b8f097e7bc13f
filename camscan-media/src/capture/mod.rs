//! Capture devices and constraint-to-mode selection
//!
//! Backends describe a camera as a [`CaptureDevice`] (facing direction plus the
//! native modes it can stream) and use [`select_mode`] to decide whether a
//! constraint record can be met and at what delivered resolution.

pub mod mock;
#[cfg(feature = "native")]
pub mod native;

use camscan_core::{
    FacingMode, MediaConstraints, NegotiationError, ResizeMode, ResolutionSpec, VideoConstraints,
    VideoRequest,
};

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Resolution {
    /// Create a resolution
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 640x480
    pub const VGA: Self = Self::new(640, 480);
    /// 1280x720
    pub const HD: Self = Self::new(1280, 720);
    /// 1920x1080
    pub const FULL_HD: Self = Self::new(1920, 1080);

    /// Width times height
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether this mode is at least `width` x `height`
    pub fn covers(&self, width: u32, height: u32) -> bool {
        self.width >= width && self.height >= height
    }
}

/// A camera as seen by a negotiator
#[derive(Debug, Clone)]
pub struct CaptureDevice {
    /// Device identifier
    pub id: String,
    /// Human readable name
    pub label: String,
    /// Facing direction, `None` when the platform does not report one
    pub facing: Option<FacingMode>,
    /// Native streaming modes
    pub modes: Vec<Resolution>,
}

impl CaptureDevice {
    /// Largest native mode by pixel count
    pub fn largest_mode(&self) -> Option<Resolution> {
        self.modes.iter().copied().max_by_key(|m| m.pixel_count())
    }
}

/// Decide the resolution `device` would deliver for `constraints`.
///
/// Mirrors how browsers treat the record: an exact `facingMode` the device does
/// not report is overconstrained; with `crop-and-scale` any native mode at least
/// as large as the request can be cropped down, otherwise only native modes count
/// and bare width/height values pick the closest one.
pub fn select_mode(
    device: &CaptureDevice,
    constraints: &MediaConstraints,
) -> Result<Resolution, NegotiationError> {
    let largest = device.largest_mode().ok_or_else(|| {
        NegotiationError::from_named("NotFoundError", format!("{} has no video modes", device.id))
    })?;

    let video = match &constraints.video {
        VideoRequest::Any(_) => return Ok(largest),
        VideoRequest::Constrained(video) => video,
    };

    if let Some(required) = video.facing_mode {
        if device.facing != Some(required.exact) {
            return Err(NegotiationError::capability("facingMode"));
        }
    }

    let spec = video.resolution;
    if !spec.is_satisfiable() {
        return Err(NegotiationError::capability(unsatisfiable_axis(&spec)));
    }

    let crop = video.resize_mode == Some(ResizeMode::CropAndScale);
    let chosen = match spec {
        ResolutionSpec::Exact { width, height } if crop => {
            largest.covers(width, height).then(|| Resolution::new(width, height))
        }
        // bare values are targets, as with getUserMedia
        ResolutionSpec::Exact { width, height } => closest_mode(device, width, height),
        ResolutionSpec::Ideal { width, height } => {
            if crop {
                Some(Resolution::new(
                    width.ideal.min(largest.width),
                    height.ideal.min(largest.height),
                ))
            } else {
                closest_mode(device, width.ideal, height.ideal)
            }
        }
        ResolutionSpec::Range { width, height } => {
            if crop {
                largest.covers(width.min, height.min).then(|| {
                    Resolution::new(largest.width.min(width.max), largest.height.min(height.max))
                })
            } else {
                device
                    .modes
                    .iter()
                    .copied()
                    .filter(|m| width.contains(m.width) && height.contains(m.height))
                    .max_by_key(|m| m.pixel_count())
            }
        }
    };

    chosen.ok_or_else(|| NegotiationError::capability(format!("no mode of {} matches", device.id)))
}

/// Whether a backend that cannot crop may keep a stream delivered at
/// `width` x `height`. Bare width/height values only steer mode choice; with a
/// resize mode they are held to exactly.
pub fn accepts_delivered(video: &VideoConstraints, width: u32, height: u32) -> bool {
    match video.resolution {
        ResolutionSpec::Exact { .. } if video.resize_mode.is_none() => true,
        spec => spec.accepts(width, height),
    }
}

fn closest_mode(device: &CaptureDevice, width: u32, height: u32) -> Option<Resolution> {
    device
        .modes
        .iter()
        .copied()
        .min_by_key(|m| m.width.abs_diff(width) as u64 + m.height.abs_diff(height) as u64)
}

fn unsatisfiable_axis(spec: &ResolutionSpec) -> &'static str {
    match spec {
        ResolutionSpec::Range { width, .. } if !width.is_satisfiable() => "width",
        ResolutionSpec::Exact { width: 0, .. } => "width",
        _ => "height",
    }
}
