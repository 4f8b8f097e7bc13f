//! Capture constraint profiles and the fallback ladder
//!
//! A [`ConstraintProfile`] holds one constraint set per device orientation. The
//! [`ProfileLadder`] orders profiles from most preferred to last resort. All types
//! serialise to the record shape the negotiation boundary accepts:
//! `{video: {width, height, ...}, audio: false}`.

use crate::error::CaptureError;
use crate::orientation::Orientation;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// `{ideal: n}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdealValue {
    /// Preferred value
    pub ideal: u32,
}

/// `{min: a, max: b}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lower bound, inclusive
    pub min: u32,
    /// Upper bound, inclusive
    pub max: u32,
}

impl ValueRange {
    /// A range is satisfiable only when `min <= max`
    pub fn is_satisfiable(&self) -> bool {
        self.min <= self.max
    }

    /// Whether `value` falls inside the bounds
    pub fn contains(&self, value: u32) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Requested capture resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResolutionSpec {
    /// `{width: w, height: h}`
    Exact {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// `{width: {ideal}, height: {ideal}}`
    Ideal {
        /// Preferred width
        width: IdealValue,
        /// Preferred height
        height: IdealValue,
    },
    /// `{width: {min, max}, height: {min, max}}`
    Range {
        /// Acceptable widths
        width: ValueRange,
        /// Acceptable heights
        height: ValueRange,
    },
}

impl ResolutionSpec {
    /// Exact resolution
    pub const fn exact(width: u32, height: u32) -> Self {
        ResolutionSpec::Exact { width, height }
    }

    /// Ideal resolution
    pub const fn ideal(width: u32, height: u32) -> Self {
        ResolutionSpec::Ideal {
            width: IdealValue { ideal: width },
            height: IdealValue { ideal: height },
        }
    }

    /// Resolution bounded per axis, given as `(min, max)` pairs
    pub const fn range(width: (u32, u32), height: (u32, u32)) -> Self {
        ResolutionSpec::Range {
            width: ValueRange {
                min: width.0,
                max: width.1,
            },
            height: ValueRange {
                min: height.0,
                max: height.1,
            },
        }
    }

    /// False when no resolution could ever satisfy these bounds
    pub fn is_satisfiable(&self) -> bool {
        match self {
            ResolutionSpec::Exact { width, height } => *width > 0 && *height > 0,
            ResolutionSpec::Ideal { .. } => true,
            ResolutionSpec::Range { width, height } => {
                width.is_satisfiable() && height.is_satisfiable()
            }
        }
    }

    /// Whether a delivered resolution satisfies this request. Ideal values are hints and
    /// accept anything.
    pub fn accepts(&self, delivered_width: u32, delivered_height: u32) -> bool {
        match self {
            ResolutionSpec::Exact { width, height } => {
                *width == delivered_width && *height == delivered_height
            }
            ResolutionSpec::Ideal { .. } => true,
            ResolutionSpec::Range { width, height } => {
                width.contains(delivered_width) && height.contains(delivered_height)
            }
        }
    }

    /// The resolution a device should aim for
    pub fn target(&self) -> (u32, u32) {
        match self {
            ResolutionSpec::Exact { width, height } => (*width, *height),
            ResolutionSpec::Ideal { width, height } => (width.ideal, height.ideal),
            ResolutionSpec::Range { width, height } => (width.max, height.max),
        }
    }
}

/// Camera facing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera
    User,
    /// Rear camera
    Environment,
}

/// `{exact: "environment"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacingConstraint {
    /// Required facing direction
    pub exact: FacingMode,
}

/// How the platform may adapt native camera output to the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeMode {
    /// Native resolutions only
    None,
    /// Platform may crop and downscale
    CropAndScale,
}

/// Video part of a constraint record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraints {
    /// Resize behaviour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize_mode: Option<ResizeMode>,
    /// Required camera
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing_mode: Option<FacingConstraint>,
    /// Requested resolution
    #[serde(flatten)]
    pub resolution: ResolutionSpec,
}

impl VideoConstraints {
    /// Resolution only, no facing or resize requirement
    pub fn new(resolution: ResolutionSpec) -> Self {
        Self {
            resize_mode: None,
            facing_mode: None,
            resolution,
        }
    }

    /// Rear camera, crop-and-scale allowed
    pub fn rear_camera(resolution: ResolutionSpec) -> Self {
        Self {
            resize_mode: Some(ResizeMode::CropAndScale),
            facing_mode: Some(FacingConstraint {
                exact: FacingMode::Environment,
            }),
            resolution,
        }
    }
}

/// Constraint set for one orientation: `{video: {...}, audio: false}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrientationConstraints {
    /// Video constraints
    pub video: VideoConstraints,
    /// Always false; capture never requests audio
    #[serde(default)]
    pub audio: bool,
}

impl OrientationConstraints {
    /// Video-only constraint set
    pub fn new(video: VideoConstraints) -> Self {
        Self {
            video,
            audio: false,
        }
    }

    /// The record handed to the negotiator
    pub fn to_media_constraints(&self) -> MediaConstraints {
        MediaConstraints {
            video: VideoRequest::Constrained(self.video.clone()),
            audio: false,
        }
    }
}

/// Video half of a negotiation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VideoRequest {
    /// `video: true`, any camera at any resolution
    Any(bool),
    /// Constrained request
    Constrained(VideoConstraints),
}

/// The constraint record passed across the negotiation boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaConstraints {
    /// Video request
    pub video: VideoRequest,
    /// Always false
    pub audio: bool,
}

impl MediaConstraints {
    /// `{video: true, audio: false}`, used for permission priming
    pub fn any_video() -> Self {
        Self {
            video: VideoRequest::Any(true),
            audio: false,
        }
    }

    /// The video constraints, if this is a constrained request
    pub fn video_constraints(&self) -> Option<&VideoConstraints> {
        match &self.video {
            VideoRequest::Constrained(video) => Some(video),
            VideoRequest::Any(_) => None,
        }
    }

    /// JSON form of the record
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// A named pair of orientation-specific constraint sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintProfile {
    /// Profile name, unique within a ladder
    pub name: String,
    /// Used when the device is in portrait
    #[serde(rename = "portraitSettings")]
    pub portrait: OrientationConstraints,
    /// Used when the device is in landscape
    #[serde(rename = "landscapeSettings")]
    pub landscape: OrientationConstraints,
}

impl ConstraintProfile {
    /// Create a profile
    pub fn new(
        name: impl Into<String>,
        portrait: OrientationConstraints,
        landscape: OrientationConstraints,
    ) -> Self {
        Self {
            name: name.into(),
            portrait,
            landscape,
        }
    }

    /// Pick the half matching `orientation`
    pub fn resolve(&self, orientation: Orientation) -> &OrientationConstraints {
        match orientation {
            Orientation::Portrait => &self.portrait,
            Orientation::Landscape => &self.landscape,
        }
    }
}

/// Name of the first, most restrictive standard profile
pub const DEFAULT_PROFILE: &str = "default";

/// Ordered list of constraint profiles tried until one succeeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ConstraintProfile>", into = "Vec<ConstraintProfile>")]
pub struct ProfileLadder {
    profiles: Vec<ConstraintProfile>,
}

impl ProfileLadder {
    /// Build a ladder, rejecting an empty list, duplicate names or a profile
    /// that asks for audio
    pub fn new(profiles: Vec<ConstraintProfile>) -> Result<Self, CaptureError> {
        if profiles.is_empty() {
            return Err(CaptureError::Configuration {
                message: "Profile ladder must contain at least one profile".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for profile in &profiles {
            if !seen.insert(profile.name.as_str()) {
                return Err(CaptureError::Configuration {
                    message: format!("Duplicate constraint profile '{}'", profile.name),
                });
            }
            if profile.portrait.audio || profile.landscape.audio {
                return Err(CaptureError::Configuration {
                    message: format!("Constraint profile '{}' requests audio", profile.name),
                });
            }
        }

        Ok(Self { profiles })
    }

    /// The four-step ladder used by the card scanner: `default`, `second`,
    /// `third`, `forth`.
    ///
    /// The landscape halves of `second` and `third` swap their bounds
    /// (`min > max`) and can never be satisfied; they are kept as shipped.
    pub fn standard() -> Self {
        let rear = |resolution| OrientationConstraints::new(VideoConstraints::rear_camera(resolution));
        let plain = |resolution| OrientationConstraints::new(VideoConstraints::new(resolution));

        Self {
            profiles: vec![
                ConstraintProfile::new(
                    DEFAULT_PROFILE,
                    rear(ResolutionSpec::ideal(630, 1000)),
                    rear(ResolutionSpec::ideal(1000, 630)),
                ),
                ConstraintProfile::new(
                    "second",
                    rear(ResolutionSpec::range((378, 630), (600, 1000))),
                    rear(ResolutionSpec::range((630, 378), (1000, 600))),
                ),
                ConstraintProfile::new(
                    "third",
                    rear(ResolutionSpec::range((200, 800), (300, 1512))),
                    rear(ResolutionSpec::range((800, 200), (1512, 300))),
                ),
                ConstraintProfile::new(
                    "forth",
                    plain(ResolutionSpec::exact(600, 378)),
                    plain(ResolutionSpec::exact(600, 378)),
                ),
            ],
        }
    }

    /// Number of profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Always false for a constructed ladder
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profile at `index` (0-based)
    pub fn get(&self, index: usize) -> Option<&ConstraintProfile> {
        self.profiles.get(index)
    }

    /// Look a profile up by name
    pub fn find(&self, name: &str) -> Option<&ConstraintProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Profiles in ladder order
    pub fn iter(&self) -> std::slice::Iter<'_, ConstraintProfile> {
        self.profiles.iter()
    }

    /// Profile names in ladder order
    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }
}

impl Default for ProfileLadder {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<ConstraintProfile>> for ProfileLadder {
    type Error = CaptureError;

    fn try_from(profiles: Vec<ConstraintProfile>) -> Result<Self, Self::Error> {
        Self::new(profiles)
    }
}

impl From<ProfileLadder> for Vec<ConstraintProfile> {
    fn from(ladder: ProfileLadder) -> Self {
        ladder.profiles
    }
}

impl<'a> IntoIterator for &'a ProfileLadder {
    type Item = &'a ConstraintProfile;
    type IntoIter = std::slice::Iter<'a, ConstraintProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_standard_ladder_order() {
        let ladder = ProfileLadder::standard();
        assert_eq!(ladder.names(), vec!["default", "second", "third", "forth"]);
        assert_eq!(ladder.len(), 4);
    }

    #[test]
    fn test_resolve_selects_orientation_half() {
        for profile in &ProfileLadder::standard() {
            assert_eq!(profile.resolve(Orientation::Portrait), &profile.portrait);
            assert_eq!(profile.resolve(Orientation::Landscape), &profile.landscape);
        }
    }

    #[test]
    fn test_default_profile_wire_shape() {
        let ladder = ProfileLadder::standard();
        let default = ladder.find("default").unwrap();
        let record = default.resolve(Orientation::Portrait).to_media_constraints();
        assert_eq!(
            record.to_json(),
            json!({
                "video": {
                    "resizeMode": "crop-and-scale",
                    "facingMode": { "exact": "environment" },
                    "width": { "ideal": 630 },
                    "height": { "ideal": 1000 }
                },
                "audio": false
            })
        );
    }

    #[test]
    fn test_range_and_exact_wire_shape() {
        let ladder = ProfileLadder::standard();
        let second = ladder.find("second").unwrap();
        assert_eq!(
            serde_json::to_value(&second.portrait.video.resolution).unwrap(),
            json!({ "width": { "min": 378, "max": 630 }, "height": { "min": 600, "max": 1000 } })
        );

        let forth = ladder.find("forth").unwrap();
        assert_eq!(
            forth.landscape.to_media_constraints().to_json(),
            json!({ "video": { "width": 600, "height": 378 }, "audio": false })
        );
    }

    #[test]
    fn test_any_video_wire_shape() {
        assert_eq!(
            MediaConstraints::any_video().to_json(),
            json!({ "video": true, "audio": false })
        );
        assert!(MediaConstraints::any_video().video_constraints().is_none());
    }

    #[test]
    fn test_swapped_landscape_ranges_are_unsatisfiable() {
        let ladder = ProfileLadder::standard();
        for name in ["second", "third"] {
            let profile = ladder.find(name).unwrap();
            assert!(profile.portrait.video.resolution.is_satisfiable());
            assert!(!profile.landscape.video.resolution.is_satisfiable());
        }
    }

    #[test]
    fn test_resolution_accepts() {
        let range = ResolutionSpec::range((378, 630), (600, 1000));
        assert!(range.accepts(480, 640));
        assert!(!range.accepts(640, 480));
        assert_eq!(range.target(), (630, 1000));

        let exact = ResolutionSpec::exact(600, 378);
        assert!(exact.accepts(600, 378));
        assert!(!exact.accepts(640, 480));

        assert!(ResolutionSpec::ideal(630, 1000).accepts(1920, 1080));
    }

    #[test]
    fn test_ladder_validation() {
        assert!(ProfileLadder::new(vec![]).is_err());

        let profile = ProfileLadder::standard().get(0).unwrap().clone();
        let duplicate = ProfileLadder::new(vec![profile.clone(), profile.clone()]);
        assert!(matches!(duplicate, Err(CaptureError::Configuration { .. })));

        let mut noisy = profile;
        noisy.landscape.audio = true;
        assert!(ProfileLadder::new(vec![noisy]).is_err());
    }

    #[test]
    fn test_ladder_from_json() {
        let raw = json!([
            {
                "name": "only",
                "portraitSettings": { "video": { "width": { "ideal": 720 }, "height": { "ideal": 1280 } }, "audio": false },
                "landscapeSettings": { "video": { "facingMode": { "exact": "user" }, "width": { "min": 640, "max": 1280 }, "height": { "min": 360, "max": 720 } } }
            }
        ]);
        let ladder: ProfileLadder = serde_json::from_value(raw).unwrap();
        let only = ladder.find("only").unwrap();
        assert_eq!(only.portrait.video.resolution, ResolutionSpec::ideal(720, 1280));
        assert_eq!(
            only.landscape.video.resolution,
            ResolutionSpec::range((640, 1280), (360, 720))
        );
        assert_eq!(
            only.landscape.video.facing_mode,
            Some(FacingConstraint { exact: FacingMode::User })
        );

        let empty: Result<ProfileLadder, _> = serde_json::from_value(json!([]));
        assert!(empty.is_err());
    }
}
