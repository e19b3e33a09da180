//! Audio impact detection pipeline.
//!
//! The microphone stream is downmixed to mono f32 frames on the capture
//! callback thread and handed to the detection loop over a bounded channel.
//! Each tick the detector reduces the most recent window to one normalized
//! frequency-domain level; a spike above the session threshold is a
//! candidate impact. Debouncing is the state machine's job, not ours.

mod dispatch;
mod impact;
mod meter;

pub use dispatch::{append_downmixed_samples, FrameDispatcher};
pub use impact::ImpactDetector;
pub use meter::LiveMeter;

/// Analysis window length in samples. Matches the analyser bin count the
/// capture pipeline was tuned against.
pub const FFT_SIZE: usize = 256;

/// Blend factor carried between ticks so a single noisy window does not
/// whipsaw the level meter.
pub const SMOOTHING: f32 = 0.3;
