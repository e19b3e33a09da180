//! Geometric reduction of raw landmarks to a readiness signal.

use super::{
    Landmark, PoseFrame, LEFT_HIP, LEFT_SHOULDER, LEFT_WRIST, RIGHT_HIP, RIGHT_SHOULDER,
    RIGHT_WRIST,
};

/// Visibility a landmark needs before it counts as seen.
const VISIBILITY_FLOOR: f32 = 0.5;
/// How many of the six key landmarks must be visible for "in frame".
const MIN_VISIBLE_KEY_LANDMARKS: usize = 4;
/// Max horizontal wrist separation for hands-together (normalized units).
const WRIST_GAP_MAX: f32 = 0.15;
/// Max hip height difference for a level stance (normalized units).
const HIP_LEVEL_MAX: f32 = 0.1;

/// Compact per-tick pose signal consumed by the state machine. Recomputed
/// fresh every detection tick, never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoseStatus {
    /// Enough key landmarks (shoulders, hips, wrists) are visible.
    pub in_frame: bool,
    /// Wrists together, below shoulder height, hips level: the stationary
    /// stance just before a swing.
    pub in_address_position: bool,
    /// Mean visibility across the six key landmarks.
    pub confidence: f32,
}

/// Reduce one estimator frame to a [`PoseStatus`].
pub fn analyze(frame: &PoseFrame) -> PoseStatus {
    let Some(pose) = frame.poses.first() else {
        return PoseStatus::default();
    };

    let key_indices = [
        LEFT_SHOULDER,
        RIGHT_SHOULDER,
        LEFT_HIP,
        RIGHT_HIP,
        LEFT_WRIST,
        RIGHT_WRIST,
    ];
    let key: Vec<Option<Landmark>> = key_indices
        .iter()
        .map(|&idx| pose.get(idx).copied())
        .collect();

    let visible = key
        .iter()
        .filter(|l| l.map(|l| l.visibility > VISIBILITY_FLOOR).unwrap_or(false))
        .count();
    let in_frame = visible >= MIN_VISIBLE_KEY_LANDMARKS;

    let confidence = key
        .iter()
        .flatten()
        .map(|l| l.visibility)
        .sum::<f32>()
        / key_indices.len() as f32;

    let in_address_position = in_frame && address_position(pose);

    PoseStatus {
        in_frame,
        in_address_position,
        confidence,
    }
}

/// Hands close together horizontally, wrists below shoulder height (y grows
/// downward), hips roughly level. All three must hold.
fn address_position(pose: &[Landmark]) -> bool {
    let (Some(ls), Some(rs), Some(lh), Some(rh), Some(lw), Some(rw)) = (
        pose.get(LEFT_SHOULDER),
        pose.get(RIGHT_SHOULDER),
        pose.get(LEFT_HIP),
        pose.get(RIGHT_HIP),
        pose.get(LEFT_WRIST),
        pose.get(RIGHT_WRIST),
    ) else {
        return false;
    };

    let hands_close = (lw.x - rw.x).abs() < WRIST_GAP_MAX;
    let hands_low = lw.y > ls.y && rw.y > rs.y;
    let hips_level = (lh.y - rh.y).abs() < HIP_LEVEL_MAX;

    hands_close && hands_low && hips_level
}
