//! Acquisition Demo - fallback ladder against virtual cameras
//!
//! Runs the controller against a phone-style rear camera, a desktop webcam and
//! a device that refuses everything, then rotates the phone and grabs a snapshot.
//!
//! Run with `RUST_LOG=camscan_core=debug` to see every constraint record sent.

use anyhow::Result;
use camscan::{
    CameraController, CameraEvent, MockNegotiator, Orientation, OrientationSource,
    ScannerConfig, SharedOrientation,
};

async fn run_device(
    name: &str,
    config: &ScannerConfig,
    mock: MockNegotiator,
    orientation: SharedOrientation,
) -> Result<()> {
    println!("\n📱 {}", name);
    println!("{}", "-".repeat(name.len() + 3));

    let mut camera = CameraController::builder(mock.clone(), orientation.clone())
        .config(config.clone())
        .build()?;
    let mut events = camera.subscribe();

    let permission = camera.request_permission().await;
    println!("🔐 Permission: {:?}", permission);

    if let Err(e) = camera.start().await {
        println!("⚠️  {}", e);
    }

    if camera.is_active() {
        orientation.set(match orientation.orientation() {
            Orientation::Portrait => Orientation::Landscape,
            Orientation::Landscape => Orientation::Portrait,
        });
        if let Err(e) = camera.on_orientation_change().await {
            println!("⚠️  Rotation: {}", e);
        }
    }

    if camera.is_active() {
        let frame = camera.take_snapshot()?;
        println!("📸 Snapshot: {}x{} ({} bytes)", frame.width, frame.height, frame.data.len());
    }
    camera.stop();

    for event in events.drain() {
        match event {
            CameraEvent::Acquired { profile, orientation, attempts } => println!(
                "✅ Acquired with '{}' in {} after {} attempt(s)",
                profile, orientation, attempts
            ),
            CameraEvent::Reacquired { profile, orientation } => {
                println!("🔄 Re-acquired with '{}' in {}", profile, orientation)
            }
            CameraEvent::Exhausted { attempts } => {
                println!("❌ No profile worked after {} attempt(s), showing fallback UI", attempts)
            }
            other => println!("📣 {:?}", other),
        }
    }

    println!(
        "📊 Negotiations: {}, fallback UI: {}, leaked streams: {}",
        mock.call_count(),
        camera.is_fallback_ui(),
        mock.live_handles()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ScannerConfig::default();
    config.init_logging()?;

    println!("🎥 Camera Acquisition Demo");
    println!("==========================");

    run_device(
        "Rear phone camera",
        &config,
        MockNegotiator::rear_camera(),
        SharedOrientation::new(Orientation::Portrait),
    )
    .await?;

    run_device(
        "Desktop webcam",
        &config,
        MockNegotiator::webcam(),
        SharedOrientation::new(Orientation::Landscape),
    )
    .await?;

    let blocked = MockNegotiator::rear_camera();
    blocked.deny_permission(true);
    run_device("Blocked camera", &config, blocked, SharedOrientation::default()).await?;

    Ok(())
}
