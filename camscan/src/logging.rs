//! Structured logging setup

use crate::error::{ScanError, ScanResult};
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` is used. Fails if a
/// subscriber is already installed.
pub fn init_logging(default_filter: &str) -> ScanResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| ScanError::Config {
            message: format!("Invalid log filter '{}': {}", default_filter, e),
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| ScanError::Config {
            message: format!("Failed to initialize logging: {}", e),
        })
}
