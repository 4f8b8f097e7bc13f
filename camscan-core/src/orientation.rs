//! Device orientation and the sources that report it

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Device orientation class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Taller than wide (or square)
    Portrait,
    /// Wider than tall
    Landscape,
}

impl Orientation {
    /// Classify a viewport the way the `(orientation: portrait)` media query does:
    /// portrait whenever height is at least the width.
    pub fn from_viewport(width: u32, height: u32) -> Self {
        if height >= width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reports the current orientation. Queried once per negotiation attempt.
pub trait OrientationSource: Send + Sync {
    /// Current orientation
    fn orientation(&self) -> Orientation;
}

impl OrientationSource for Orientation {
    fn orientation(&self) -> Orientation {
        *self
    }
}

impl<T: OrientationSource + ?Sized> OrientationSource for Arc<T> {
    fn orientation(&self) -> Orientation {
        (**self).orientation()
    }
}

/// Orientation cell shared between the UI layer, which writes it on rotation or
/// resize, and the acquisition code, which reads it
#[derive(Debug, Clone)]
pub struct SharedOrientation {
    inner: Arc<RwLock<Orientation>>,
}

impl SharedOrientation {
    /// Create a cell holding `initial`
    pub fn new(initial: Orientation) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Overwrite the orientation
    pub fn set(&self, orientation: Orientation) {
        *self.inner.write() = orientation;
    }

    /// Reclassify from viewport dimensions and store the result
    pub fn update_viewport(&self, width: u32, height: u32) -> Orientation {
        let orientation = Orientation::from_viewport(width, height);
        self.set(orientation);
        orientation
    }
}

impl Default for SharedOrientation {
    fn default() -> Self {
        Self::new(Orientation::Portrait)
    }
}

impl OrientationSource for SharedOrientation {
    fn orientation(&self) -> Orientation {
        *self.inner.read()
    }
}
