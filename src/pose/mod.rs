//! Pose signal extraction: reduce body landmarks to a readiness signal.
//!
//! A landmark estimator (an external model capability that may be absent) is
//! run over live video frames; the resulting landmarks are reduced to a
//! compact [`PoseStatus`] every tick. No temporal smoothing: noisy single
//! frames are tolerated by the state machine's geometric test.

mod analyze;
#[cfg(test)]
mod tests;

pub use analyze::{analyze, PoseStatus};

use crate::errors::InferenceError;
use crate::sensor::VideoFrame;
use anyhow::Result;
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

// MediaPipe pose landmark indices (33-point model).
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;

/// A single landmark in normalized image coordinates, y growing downward.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub visibility: f32,
}

/// One frame of estimator output: zero or more detected poses, each a list
/// of landmarks indexed by the constants above.
#[derive(Debug, Clone, Default)]
pub struct PoseFrame {
    pub poses: Vec<Vec<Landmark>>,
}

/// Per-frame landmark estimation capability.
///
/// Implementations wrap an external model. `infer` is purely a function of
/// the given frame; a failure on one tick is transient and must not abort
/// the session.
pub trait PoseEstimator: Send {
    fn infer(&mut self, frame: &VideoFrame, timestamp: Duration) -> Result<PoseFrame, InferenceError>;
}

/// Load the pose capability with a bounded wait.
///
/// The factory (model download/load) runs on a worker thread; if it has not
/// produced an estimator within `timeout` the session proceeds in audio-only
/// mode and never polls for late availability. A factory error is treated
/// the same as a timeout.
pub fn initialize_with_timeout<F>(factory: F, timeout: Duration) -> Option<Box<dyn PoseEstimator>>
where
    F: FnOnce() -> Result<Box<dyn PoseEstimator>> + Send + 'static,
{
    let (sender, receiver) = bounded::<Result<Box<dyn PoseEstimator>>>(1);
    thread::spawn(move || {
        let _ = sender.send(factory());
    });

    match receiver.recv_timeout(timeout) {
        Ok(Ok(estimator)) => {
            debug!("pose estimator ready");
            Some(estimator)
        }
        Ok(Err(err)) => {
            warn!(error = %err, "pose estimator init failed; continuing audio-only");
            None
        }
        Err(RecvTimeoutError::Timeout) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "pose estimator init timed out; continuing audio-only");
            None
        }
        Err(RecvTimeoutError::Disconnected) => {
            warn!("pose estimator init thread died; continuing audio-only");
            None
        }
    }
}
