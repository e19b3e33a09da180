//! Error taxonomy for the capture pipeline.
//!
//! Sensor acquisition failures are classified so the caller can show
//! actionable guidance (permission vs. hardware vs. busy). Detection-layer
//! failures never reach the caller; they degrade the session mode instead.

use thiserror::Error;

/// Why acquiring the camera/microphone stream failed. All variants are
/// terminal for the current attempt and retryable by the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AcquireError {
    #[error("sensor permission denied: {0}")]
    PermissionDenied(String),
    #[error("sensor device not found: {0}")]
    DeviceNotFound(String),
    #[error("sensor device busy: {0}")]
    DeviceBusy(String),
}

impl AcquireError {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            AcquireError::PermissionDenied(_) => "permission_denied",
            AcquireError::DeviceNotFound(_) => "device_not_found",
            AcquireError::DeviceBusy(_) => "device_busy",
        }
    }

    /// Human-actionable guidance for the failure classification.
    pub fn user_hint(&self) -> String {
        match self {
            AcquireError::PermissionDenied(_) => {
                format!("Allow camera/microphone access and try again. {}", permission_hint())
            }
            AcquireError::DeviceNotFound(_) => {
                "No capture device found. Connect a camera or microphone and try again.".to_string()
            }
            AcquireError::DeviceBusy(_) => {
                "The device is in use by another app. Close other apps using it and try again."
                    .to_string()
            }
        }
    }
}

fn permission_hint() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "macOS: System Settings > Privacy & Security > Camera/Microphone."
    }
    #[cfg(target_os = "linux")]
    {
        "Linux: check PipeWire/PulseAudio permissions and ensure the device is not muted."
    }
    #[cfg(target_os = "windows")]
    {
        "Windows: Settings > Privacy & Security > Camera/Microphone."
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        "Check OS camera/microphone permissions."
    }
}

/// Recorder primitive failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecorderError {
    #[error("recorder already running")]
    AlreadyRecording,
    #[error("recorder start failed: {0}")]
    StartFailed(String),
}

/// A single-tick pose inference failure. Recovered locally by skipping the
/// tick; a long enough streak demotes the session to audio-only mode.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("transient pose inference failure: {0}")]
pub struct InferenceError(pub String);

/// Clip finalization failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FinalizeError {
    #[error("capture buffer holds no slices")]
    EmptyBuffer,
}
