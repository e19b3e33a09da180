//! Sensor adapters: live camera/microphone stream lifecycle.
//!
//! The host platform's media capture is behind [`SensorHost`] so the session
//! can run against the real microphone adapter, and the tests against
//! scripted streams. Acquisition failures are classified (permission vs.
//! hardware vs. busy) so the caller can show actionable guidance.

pub mod mic;

use crate::buffer::SliceSink;
use crate::errors::{AcquireError, RecorderError};
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Which physical camera the session wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera, the default for filming a swing.
    Environment,
    /// Front camera.
    User,
}

impl FacingMode {
    pub fn flipped(self) -> Self {
        match self {
            FacingMode::Environment => FacingMode::User,
            FacingMode::User => FacingMode::Environment,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FacingMode::Environment => "environment",
            FacingMode::User => "user",
        }
    }
}

/// Parameters for acquiring a live stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub audio: bool,
}

/// One video frame handed to the pose estimator. Pixel layout is whatever
/// the host's camera track produces; the pipeline never inspects it.
#[derive(Debug, Clone, Default)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<Vec<u8>>,
}

/// Recorder activity, mirroring the host recorder primitive's two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Inactive,
    Recording,
}

/// The host recorder primitive: chunks the live stream on its own timer and
/// delivers each chunk to the sink, independent of detection ticks.
pub trait ChunkRecorder {
    /// Begin chunked recording. The negotiated mime type is fixed from this
    /// point on.
    fn start(&mut self, interval: Duration, sink: SliceSink) -> Result<(), RecorderError>;
    /// Stop recording. Safe to call when inactive.
    fn stop(&mut self);
    fn state(&self) -> RecorderState;
    fn mime_type(&self) -> &str;
}

/// A live acquired stream. Consumers (preview, pose extractor, recorder,
/// audio analyzer) share it read-only; only the owning session reconfigures
/// it, and only by release-and-reacquire.
pub trait MediaStream {
    /// Stop all tracks. Idempotent; safe to call multiple times.
    fn release(&mut self);
    /// Number of tracks still live. Zero after `release`.
    fn live_track_count(&self) -> usize;
    /// Mono f32 frames from the audio track, if one exists. Receivers are
    /// cheap clones of one channel.
    fn audio_frames(&self) -> Option<Receiver<Vec<f32>>>;
    /// Latest video frame, if a camera track exists and has produced one.
    fn video_frame(&mut self) -> Option<VideoFrame>;
    /// Build the chunk recorder bound to this stream.
    fn recorder(&mut self) -> Result<Box<dyn ChunkRecorder>, RecorderError>;
    /// Audio frames dropped on the capture path so far (observability).
    fn frames_dropped(&self) -> usize;
}

/// Host media-capture capability.
pub trait SensorHost {
    fn acquire(&mut self, request: &StreamRequest) -> Result<Box<dyn MediaStream>, AcquireError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_mode_flips_between_cameras() {
        assert_eq!(FacingMode::Environment.flipped(), FacingMode::User);
        assert_eq!(FacingMode::User.flipped(), FacingMode::Environment);
    }

    #[test]
    fn facing_mode_serializes_snake_case() {
        let label = serde_json::to_string(&FacingMode::Environment).unwrap();
        assert_eq!(label, "\"environment\"");
    }
}
