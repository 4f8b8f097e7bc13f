//! Error types for camera acquisition

use thiserror::Error;

/// Classification of a failed negotiation, supplied by the negotiation boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NegotiationErrorKind {
    /// The user or platform refused camera access
    Permission,
    /// The device cannot satisfy the requested constraints
    Capability,
    /// Anything the boundary could not classify
    Unknown,
}

impl NegotiationErrorKind {
    /// Classify a platform error by its category name.
    ///
    /// Matching is exact on the category name, never on free-form message text.
    pub fn from_name(name: &str) -> Self {
        match name {
            "NotAllowedError" => NegotiationErrorKind::Permission,
            "OverconstrainedError" | "NotFoundError" | "NotReadableError" => {
                NegotiationErrorKind::Capability
            }
            _ => NegotiationErrorKind::Unknown,
        }
    }
}

/// A single failed negotiation attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{name}: {message}")]
pub struct NegotiationError {
    /// Structured classification
    pub kind: NegotiationErrorKind,
    /// Platform category name (e.g. `NotAllowedError`)
    pub name: String,
    /// Human readable detail
    pub message: String,
}

impl NegotiationError {
    /// Build an error from a named platform category, classifying it
    pub fn from_named(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: NegotiationErrorKind::from_name(&name),
            name,
            message: message.into(),
        }
    }

    /// Permission was denied
    pub fn permission(message: impl Into<String>) -> Self {
        Self::from_named("NotAllowedError", message)
    }

    /// The constraints could not be satisfied
    pub fn capability(message: impl Into<String>) -> Self {
        Self::from_named("OverconstrainedError", message)
    }

    /// An unclassified failure
    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            kind: NegotiationErrorKind::Unknown,
            name: "UnknownError".to_string(),
            message: message.into(),
        }
    }

    /// Whether this failure is a permission denial
    pub fn is_permission(&self) -> bool {
        self.kind == NegotiationErrorKind::Permission
    }
}

/// Main error type for camera acquisition
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Every profile of the ladder failed
    #[error("All {attempts} constraint profiles failed{}", describe_last(.last))]
    Exhausted {
        /// Number of negotiation attempts made
        attempts: u32,
        /// Error of the final attempt
        last: Option<NegotiationError>,
    },

    /// The previously working profile failed on re-acquisition
    #[error("Locked profile '{profile}' failed: {source}")]
    LockedProfileFailed {
        /// Name of the locked profile
        profile: String,
        /// Negotiation failure
        #[source]
        source: NegotiationError,
    },

    /// A profile name was not present in the ladder
    #[error("Unknown constraint profile: {name}")]
    UnknownProfile {
        /// Requested profile name
        name: String,
    },

    /// Invalid ladder or scanner configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },
}

impl CaptureError {
    /// Whether this error is terminal for the acquisition attempt and the caller
    /// should switch to a non-camera presentation
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CaptureError::Exhausted { .. } | CaptureError::LockedProfileFailed { .. }
        )
    }

    /// The last negotiation failure carried by this error, if any
    pub fn negotiation_error(&self) -> Option<&NegotiationError> {
        match self {
            CaptureError::Exhausted { last, .. } => last.as_ref(),
            CaptureError::LockedProfileFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn describe_last(last: &Option<NegotiationError>) -> String {
    last.as_ref()
        .map(|e| format!(", last error: {}", e))
        .unwrap_or_default()
}

/// Result type alias for acquisition operations
pub type CaptureResult<T> = Result<T, CaptureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_name() {
        assert_eq!(
            NegotiationErrorKind::from_name("NotAllowedError"),
            NegotiationErrorKind::Permission
        );
        assert_eq!(
            NegotiationErrorKind::from_name("OverconstrainedError"),
            NegotiationErrorKind::Capability
        );
        assert_eq!(
            NegotiationErrorKind::from_name("NotReadableError"),
            NegotiationErrorKind::Capability
        );
        assert_eq!(
            NegotiationErrorKind::from_name("AbortError"),
            NegotiationErrorKind::Unknown
        );
        // prefix matches are not permission denials
        assert_eq!(
            NegotiationErrorKind::from_name("NotAllowedErrorX"),
            NegotiationErrorKind::Unknown
        );
    }

    #[test]
    fn test_negotiation_error_display() {
        let err = NegotiationError::permission("Permission denied");
        assert_eq!(err.to_string(), "NotAllowedError: Permission denied");
        assert!(err.is_permission());
    }

    #[test]
    fn test_exhausted_display() {
        let err = CaptureError::Exhausted {
            attempts: 4,
            last: Some(NegotiationError::capability("width")),
        };
        assert_eq!(
            err.to_string(),
            "All 4 constraint profiles failed, last error: OverconstrainedError: width"
        );
        assert!(err.is_terminal());

        let bare = CaptureError::Exhausted {
            attempts: 0,
            last: None,
        };
        assert_eq!(bare.to_string(), "All 0 constraint profiles failed");
    }

    #[test]
    fn test_terminal_classification() {
        assert!(!CaptureError::UnknownProfile {
            name: "hd".to_string()
        }
        .is_terminal());
        let locked = CaptureError::LockedProfileFailed {
            profile: "second".to_string(),
            source: NegotiationError::unknown("gone"),
        };
        assert!(locked.is_terminal());
        assert_eq!(locked.negotiation_error().map(|e| e.kind), Some(NegotiationErrorKind::Unknown));
    }
}
