//! Configuration types and defaults

use crate::error::{ScanError, ScanResult};
use camscan_core::ProfileLadder;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Scanner configuration
///
/// Loadable from JSON; any omitted field takes its default.
///
/// ```json
/// { "reacquire_on_orientation_change": true, "log_filter": "camscan=debug" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Constraint profiles tried in order
    pub ladder: ProfileLadder,
    /// Re-acquire the camera with the locked profile when the orientation changes
    pub reacquire_on_orientation_change: bool,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            ladder: ProfileLadder::standard(),
            reacquire_on_orientation_change: true,
            log_filter: "info".to_string(),
        }
    }
}

impl ScannerConfig {
    /// Parse a JSON document
    pub fn from_json_str(raw: &str) -> ScanResult<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ScanError::Config {
            message: format!("Failed to parse scanner config: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> ScanResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Validate configuration
    pub fn validate(&self) -> ScanResult<()> {
        if self.log_filter.trim().is_empty() {
            return Err(ScanError::Config {
                message: "log_filter must not be empty".to_string(),
            });
        }
        EnvFilter::try_new(&self.log_filter).map_err(|e| ScanError::Config {
            message: format!("Invalid log_filter '{}': {}", self.log_filter, e),
        })?;
        Ok(())
    }

    /// Install the global subscriber with [`log_filter`](Self::log_filter) as
    /// the fallback when `RUST_LOG` is unset
    pub fn init_logging(&self) -> ScanResult<()> {
        crate::logging::init_logging(&self.log_filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert_eq!(config.ladder.names(), vec!["default", "second", "third", "forth"]);
        assert!(config.reacquire_on_orientation_change);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ScannerConfig::from_json_str(r#"{ "reacquire_on_orientation_change": false }"#)
            .unwrap();
        assert!(!config.reacquire_on_orientation_change);
        assert_eq!(config.ladder, ProfileLadder::standard());
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_custom_ladder_from_json() {
        let raw = r#"{
            "ladder": [
                {
                    "name": "hd",
                    "portraitSettings": { "video": { "width": { "ideal": 720 }, "height": { "ideal": 1280 } }, "audio": false },
                    "landscapeSettings": { "video": { "width": { "ideal": 1280 }, "height": { "ideal": 720 } }, "audio": false }
                },
                {
                    "name": "vga",
                    "portraitSettings": { "video": { "width": 480, "height": 640 } },
                    "landscapeSettings": { "video": { "width": 640, "height": 480 } }
                }
            ]
        }"#;
        let config = ScannerConfig::from_json_str(raw).unwrap();
        assert_eq!(config.ladder.names(), vec!["hd", "vga"]);
    }

    #[test]
    fn test_log_filter_directives_accepted() {
        let config =
            ScannerConfig::from_json_str(r#"{ "log_filter": "warn,camscan_core=debug" }"#).unwrap();
        assert_eq!(config.log_filter, "warn,camscan_core=debug");
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(matches!(
            ScannerConfig::from_json_str(r#"{ "ladder": [] }"#),
            Err(ScanError::Config { .. })
        ));
        assert!(ScannerConfig::from_json_str(r#"{ "log_filter": "  " }"#).is_err());
        assert!(ScannerConfig::from_json_str(r#"{ "log_filter": "camscan=loud" }"#).is_err());
        assert!(ScannerConfig::from_json_str("not json").is_err());
    }
}
