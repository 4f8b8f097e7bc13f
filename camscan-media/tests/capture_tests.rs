//! Integration tests for virtual capture devices
//!
//! Covers mode selection against the standard ladder, handle lifecycle and
//! snapshot extraction.

use camscan_core::{AcquisitionSession, CaptureError, CaptureHandle, Orientation, ProfileLadder};
use camscan_media::*;
use tokio_test::{assert_err, assert_ok};

// ============================================================================
// LADDER AGAINST DEVICE MODELS
// ============================================================================

#[tokio::test]
async fn test_rear_camera_accepts_default_profile() {
    let mock = MockNegotiator::rear_camera();
    let mut session = AcquisitionSession::new();

    let acquired = assert_ok!(
        session
            .acquire(&ProfileLadder::standard(), &Orientation::Portrait, &mock)
            .await
    );

    assert_eq!(acquired.profile, "default");
    assert_eq!(acquired.handle.resolution(), Some((630, 1000)));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_webcam_falls_through_to_forth() {
    // no facing direction reported, so every rear-camera profile is overconstrained
    let mock = MockNegotiator::webcam();
    let mut session = AcquisitionSession::new();

    let acquired = assert_ok!(
        session
            .acquire(&ProfileLadder::standard(), &Orientation::Landscape, &mock)
            .await
    );

    assert_eq!(acquired.profile, "forth");
    assert_eq!(acquired.attempts, 4);
    assert_eq!(acquired.handle.resolution(), Some((600, 378)));
    assert_eq!(mock.live_handles(), 1);
}

#[tokio::test]
async fn test_device_without_modes_exhausts() {
    let mock = MockNegotiator::new(CaptureDevice {
        id: "broken".to_string(),
        label: "Broken".to_string(),
        facing: None,
        modes: vec![],
    });
    let mut session = AcquisitionSession::new();

    let err = assert_err!(
        session
            .acquire(&ProfileLadder::standard(), &Orientation::Portrait, &mock)
            .await
    );

    match err {
        CaptureError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 4);
            assert_eq!(last.map(|e| e.name), Some("NotFoundError".to_string()));
        }
        other => panic!("Expected exhaustion, got {:?}", other),
    }
    assert_eq!(mock.live_handles(), 0);
}

#[tokio::test]
async fn test_landscape_rear_camera_drops_to_forth() {
    let mock = MockNegotiator::rear_camera();
    mock.fail_next(1);
    let mut session = AcquisitionSession::new();

    let acquired = assert_ok!(
        session
            .acquire(&ProfileLadder::standard(), &Orientation::Landscape, &mock)
            .await
    );

    // second and third carry min > max in landscape
    assert_eq!(acquired.profile, "forth");
    assert_eq!(acquired.attempts, 4);
    assert_eq!(acquired.handle.resolution(), Some((640, 480)));
    assert_eq!(mock.live_handles(), 1);
}

#[tokio::test]
async fn test_rear_camera_locks_forth_as_last_resort() {
    let mock = MockNegotiator::rear_camera();
    mock.fail_next(3);
    let mut session = AcquisitionSession::new();

    let acquired = assert_ok!(
        session
            .acquire(&ProfileLadder::standard(), &Orientation::Portrait, &mock)
            .await
    );

    assert_eq!(acquired.profile, "forth");
    assert_eq!(acquired.handle.resolution(), Some((640, 480)));
    assert_eq!(session.locked_profile(), Some("forth"));
    assert_eq!(mock.call_count(), 4);
}

// ============================================================================
// SNAPSHOT TESTS
// ============================================================================

#[tokio::test]
async fn test_snapshot_matches_delivered_resolution() {
    let mock = MockNegotiator::webcam();
    let mut session = AcquisitionSession::new();
    let mut acquired = assert_ok!(
        session
            .acquire(&ProfileLadder::standard(), &Orientation::Portrait, &mock)
            .await
    );

    let frame = assert_ok!(acquired.handle.grab_frame());
    assert_eq!((frame.width, frame.height), (600, 378));
    assert_eq!(frame.data.len(), 600 * 378 * 4);
    assert!(frame.timestamp > 0);
}

#[tokio::test]
async fn test_snapshot_after_stop_fails() {
    let mock = MockNegotiator::rear_camera();
    let mut session = AcquisitionSession::new();
    let mut acquired = assert_ok!(
        session
            .acquire(&ProfileLadder::standard(), &Orientation::Portrait, &mock)
            .await
    );

    acquired.handle.stop();
    let err = assert_err!(acquired.handle.grab_frame());
    assert_eq!(err.category(), ErrorCategory::State);
}
