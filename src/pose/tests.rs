use super::*;
use crate::errors::InferenceError;
use crate::sensor::VideoFrame;
use std::time::Duration;

/// Build a 33-landmark pose with everything invisible, then place the six
/// key landmarks.
fn pose_with(
    shoulders: (Landmark, Landmark),
    hips: (Landmark, Landmark),
    wrists: (Landmark, Landmark),
) -> PoseFrame {
    let mut pose = vec![Landmark::default(); 33];
    pose[LEFT_SHOULDER] = shoulders.0;
    pose[RIGHT_SHOULDER] = shoulders.1;
    pose[LEFT_HIP] = hips.0;
    pose[RIGHT_HIP] = hips.1;
    pose[LEFT_WRIST] = wrists.0;
    pose[RIGHT_WRIST] = wrists.1;
    PoseFrame { poses: vec![pose] }
}

fn lm(x: f32, y: f32, visibility: f32) -> Landmark {
    Landmark { x, y, visibility }
}

fn address_pose() -> PoseFrame {
    pose_with(
        (lm(0.40, 0.30, 0.9), lm(0.60, 0.30, 0.9)),
        (lm(0.42, 0.55, 0.9), lm(0.58, 0.56, 0.9)),
        (lm(0.48, 0.50, 0.9), lm(0.52, 0.50, 0.9)),
    )
}

#[test]
fn empty_frame_is_not_in_frame() {
    let status = analyze(&PoseFrame::default());
    assert!(!status.in_frame);
    assert!(!status.in_address_position);
    assert_eq!(status.confidence, 0.0);
}

#[test]
fn four_visible_key_landmarks_count_as_in_frame() {
    let frame = pose_with(
        (lm(0.4, 0.3, 0.9), lm(0.6, 0.3, 0.9)),
        (lm(0.4, 0.6, 0.9), lm(0.6, 0.6, 0.9)),
        (lm(0.5, 0.5, 0.1), lm(0.5, 0.5, 0.1)),
    );
    assert!(analyze(&frame).in_frame);
}

#[test]
fn three_visible_key_landmarks_are_not_enough() {
    let frame = pose_with(
        (lm(0.4, 0.3, 0.9), lm(0.6, 0.3, 0.9)),
        (lm(0.4, 0.6, 0.9), lm(0.6, 0.6, 0.1)),
        (lm(0.5, 0.5, 0.1), lm(0.5, 0.5, 0.1)),
    );
    assert!(!analyze(&frame).in_frame);
}

#[test]
fn address_stance_is_detected() {
    let status = analyze(&address_pose());
    assert!(status.in_frame);
    assert!(status.in_address_position);
    assert!(status.confidence > 0.8);
}

#[test]
fn wide_wrists_break_address() {
    let frame = pose_with(
        (lm(0.40, 0.30, 0.9), lm(0.60, 0.30, 0.9)),
        (lm(0.42, 0.55, 0.9), lm(0.58, 0.56, 0.9)),
        (lm(0.30, 0.50, 0.9), lm(0.70, 0.50, 0.9)),
    );
    let status = analyze(&frame);
    assert!(status.in_frame);
    assert!(!status.in_address_position);
}

#[test]
fn raised_wrists_break_address() {
    // Wrists above shoulder height, as mid-backswing.
    let frame = pose_with(
        (lm(0.40, 0.30, 0.9), lm(0.60, 0.30, 0.9)),
        (lm(0.42, 0.55, 0.9), lm(0.58, 0.56, 0.9)),
        (lm(0.48, 0.20, 0.9), lm(0.52, 0.20, 0.9)),
    );
    assert!(!analyze(&frame).in_address_position);
}

#[test]
fn tilted_hips_break_address() {
    let frame = pose_with(
        (lm(0.40, 0.30, 0.9), lm(0.60, 0.30, 0.9)),
        (lm(0.42, 0.40, 0.9), lm(0.58, 0.65, 0.9)),
        (lm(0.48, 0.50, 0.9), lm(0.52, 0.50, 0.9)),
    );
    assert!(!analyze(&frame).in_address_position);
}

#[test]
fn confidence_is_mean_key_visibility() {
    let frame = pose_with(
        (lm(0.4, 0.3, 0.6), lm(0.6, 0.3, 0.6)),
        (lm(0.4, 0.6, 0.6), lm(0.6, 0.6, 0.6)),
        (lm(0.5, 0.5, 0.6), lm(0.5, 0.5, 0.6)),
    );
    let status = analyze(&frame);
    assert!((status.confidence - 0.6).abs() < 1e-6);
}

struct InstantEstimator;

impl PoseEstimator for InstantEstimator {
    fn infer(&mut self, _frame: &VideoFrame, _ts: Duration) -> Result<PoseFrame, InferenceError> {
        Ok(PoseFrame::default())
    }
}

#[test]
fn init_within_timeout_yields_estimator() {
    let estimator = initialize_with_timeout(
        || Ok(Box::new(InstantEstimator) as Box<dyn PoseEstimator>),
        Duration::from_secs(1),
    );
    assert!(estimator.is_some());
}

#[test]
fn slow_init_falls_back_to_none() {
    let estimator = initialize_with_timeout(
        || {
            std::thread::sleep(Duration::from_millis(200));
            Ok(Box::new(InstantEstimator) as Box<dyn PoseEstimator>)
        },
        Duration::from_millis(20),
    );
    assert!(estimator.is_none());
}

#[test]
fn failing_init_falls_back_to_none() {
    let estimator = initialize_with_timeout(
        || anyhow::bail!("model asset missing"),
        Duration::from_secs(1),
    );
    assert!(estimator.is_none());
}
