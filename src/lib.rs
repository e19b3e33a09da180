//! Automatic golf swing capture from live camera and microphone streams.
//!
//! The pipeline watches for a golfer settling into the address position,
//! keeps a short rolling buffer of recorded media, and commits a clip when
//! the impact sound of club on ball is heard. Pose detection is optional:
//! when the landmark model is unavailable or keeps failing, the session runs
//! on sound triggering alone.
//!
//! # Architecture
//!
//! - [`session::CaptureSession`]: the tick-driven state machine fusing both
//!   trigger signals
//! - [`sensor`]: host media capture behind trait seams
//! - [`pose`]: landmark geometry reduced to a readiness signal
//! - [`audio`]: spectrum-based impact level from mono mic frames
//! - [`buffer`] and [`clip`]: the rolling slice buffer and finalization

pub mod audio;
pub mod buffer;
pub mod clip;
pub mod clock;
pub mod config;
pub mod errors;
pub mod pose;
pub mod sensor;
pub mod session;
pub mod telemetry;

pub use clip::Clip;
pub use config::CaptureConfig;
pub use session::{CaptureSession, CaptureState, PoseFactory, SessionEvent};
