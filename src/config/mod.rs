//! Capture pipeline configuration.

#[cfg(test)]
mod tests;
mod validation;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_SLICE_MS: u64 = 500;
pub const DEFAULT_MAX_SLICES: usize = 10;
pub const DEFAULT_POST_IMPACT_MS: u64 = 2_000;
pub const DEFAULT_IMPACT_THRESHOLD: f32 = 0.15;
pub const DEFAULT_POSE_INIT_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_POSE_FAILURE_LIMIT: u32 = 30;
pub const DEFAULT_IDEAL_WIDTH: u32 = 1_920;
pub const DEFAULT_IDEAL_HEIGHT: u32 = 1_080;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Tunables for one capture session. Defaults match the values the pipeline
/// was tuned against; `validate()` keeps overrides inside safe ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Recorder chunk duration (milliseconds).
    pub slice_ms: u64,
    /// Rolling buffer cap in slices; cap × slice_ms is the retained window.
    pub max_slices: usize,
    /// How long recording continues after the impact (milliseconds).
    pub post_impact_ms: u64,
    /// Normalized sound level above which a tick is a candidate impact.
    pub impact_threshold: f32,
    /// Bounded wait for the pose capability before audio-only fallback.
    pub pose_init_timeout_ms: u64,
    /// Consecutive inference failures before permanent audio-only fallback.
    pub pose_failure_limit: u32,
    /// Requested camera resolution.
    pub ideal_width: u32,
    pub ideal_height: u32,
    /// Capture-thread to detection-loop channel depth, in frames.
    pub channel_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            slice_ms: DEFAULT_SLICE_MS,
            max_slices: DEFAULT_MAX_SLICES,
            post_impact_ms: DEFAULT_POST_IMPACT_MS,
            impact_threshold: DEFAULT_IMPACT_THRESHOLD,
            pose_init_timeout_ms: DEFAULT_POSE_INIT_TIMEOUT_MS,
            pose_failure_limit: DEFAULT_POSE_FAILURE_LIMIT,
            ideal_width: DEFAULT_IDEAL_WIDTH,
            ideal_height: DEFAULT_IDEAL_HEIGHT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl CaptureConfig {
    pub fn slice_interval(&self) -> Duration {
        Duration::from_millis(self.slice_ms)
    }

    pub fn post_impact_window(&self) -> Duration {
        Duration::from_millis(self.post_impact_ms)
    }

    pub fn pose_init_timeout(&self) -> Duration {
        Duration::from_millis(self.pose_init_timeout_ms)
    }
}
