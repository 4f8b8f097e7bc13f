//! Native Camera Demo - open a real camera through the fallback ladder
//!
//! Build with `--features native`. Camera 0 is treated as rear-facing so the
//! preferred profiles apply; pass `--front` to treat it as a plain webcam.

use anyhow::{bail, Context, Result};
use camscan::{
    CameraController, FacingMode, NativeCameraConfig, NokhwaNegotiator, Orientation,
    PermissionState, ScannerConfig, SharedOrientation,
};

#[tokio::main]
async fn main() -> Result<()> {
    let scanner = ScannerConfig {
        log_filter: "info,camscan_core=debug".to_string(),
        ..ScannerConfig::default()
    };
    scanner.init_logging()?;

    let front = std::env::args().any(|arg| arg == "--front");
    let config = NativeCameraConfig {
        facing: (!front).then_some(FacingMode::Environment),
        ..NativeCameraConfig::default()
    };

    println!("🎥 Native Camera Demo");
    println!("=====================");

    let orientation = SharedOrientation::new(Orientation::Landscape);
    let mut camera = CameraController::builder(NokhwaNegotiator::new(config), orientation.clone())
        .config(scanner)
        .build()?;

    match camera.request_permission().await {
        PermissionState::Denied => bail!("camera access denied"),
        state => println!("🔐 Permission: {:?}", state),
    }

    camera.start().await.context("camera could not be started")?;
    if let Some(profile) = camera.session().locked_profile() {
        println!("✅ Streaming with '{}' profile", profile);
    }

    for i in 1..=3 {
        let frame = camera.take_snapshot()?;
        println!("📸 Frame {}: {}x{} @ {}", i, frame.width, frame.height, frame.timestamp);
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }

    camera.stop();
    println!("🛑 Camera released");
    Ok(())
}
