//! The capture session: a tick-driven state machine fusing pose and audio
//! signals into an autonomous swing capture.
//!
//! The host drives [`CaptureSession::tick`] once per rendered frame. Each
//! tick performs only synchronous reads plus at most one short inference
//! call; sensor acquisition and pose-model loading are awaited once at
//! session start, never inside the loop. At most one state transition
//! commits per tick, and audio-driven transitions are only evaluated after
//! any pose transition for the tick has been applied.

mod state;

pub use state::CaptureState;

use crate::audio::{ImpactDetector, LiveMeter};
use crate::buffer::{RollingBuffer, SliceSink};
use crate::clip::{self, Clip};
use crate::clock::Clock;
use crate::config::CaptureConfig;
use crate::errors::{AcquireError, FinalizeError};
use crate::pose::{self, PoseEstimator};
use crate::sensor::{ChunkRecorder, FacingMode, MediaStream, SensorHost, StreamRequest};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Builds the pose capability. Re-invoked on every session (re)start; the
/// load runs on a worker thread bounded by the init timeout.
pub type PoseFactory = Arc<dyn Fn() -> anyhow::Result<Box<dyn PoseEstimator>> + Send + Sync>;

/// Outbound session signals. `VideoRecorded` fires exactly once per capture,
/// only on a successful finalization; `Closed` fires when the user aborts.
#[derive(Debug)]
pub enum SessionEvent {
    StateChanged {
        state: CaptureState,
        message: String,
    },
    /// Pose inference failed long enough that the session fell back to
    /// audio-only triggering. A degraded-mode notice, not a failure.
    DegradedToAudioOnly,
    VideoRecorded(Clip),
    CaptureFailed {
        reason: String,
    },
    /// Host UI hint: show or hide the fullscreen capture overlay.
    OverlayVisibility(bool),
    Closed,
}

/// Observability counters for one capture run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaptureMetrics {
    pub ticks: u64,
    pub pose_failures: u64,
    pub frames_dropped: usize,
    pub peak_level: f32,
    pub outcome: Option<String>,
}

/// One open capture UI instance. Owns the sensor stream, the rolling
/// buffer, the detectors, and every exit path that releases them.
pub struct CaptureSession {
    config: CaptureConfig,
    clock: Arc<dyn Clock>,
    host: Box<dyn SensorHost>,
    pose_factory: Option<PoseFactory>,

    state: CaptureState,
    status: String,
    facing: FacingMode,
    audio_enabled: bool,
    impact_threshold: f32,

    stream: Option<Box<dyn MediaStream>>,
    pose: Option<Box<dyn PoseEstimator>>,
    pose_failures: u32,
    detector: Option<ImpactDetector>,
    meter: LiveMeter,

    buffer: Arc<Mutex<RollingBuffer>>,
    buffer_started: bool,
    recorder: Option<Box<dyn ChunkRecorder>>,

    impact_latched: bool,
    post_impact_deadline: Option<Duration>,
    video_recorded_fired: bool,
    closed: bool,

    last_error: Option<AcquireError>,
    metrics: CaptureMetrics,
    events: Sender<SessionEvent>,
}

impl CaptureSession {
    /// Create a session and run the sensor start sequence. Acquisition
    /// failure leaves the session in the `Error` state (retryable) rather
    /// than failing construction, so the caller can show the classified
    /// reason and offer retry.
    pub fn open(
        host: Box<dyn SensorHost>,
        pose_factory: Option<PoseFactory>,
        config: CaptureConfig,
        clock: Arc<dyn Clock>,
    ) -> (Self, Receiver<SessionEvent>) {
        let (events, receiver) = unbounded();
        let mut session = Self {
            impact_threshold: config.impact_threshold,
            config,
            clock,
            host,
            pose_factory,
            state: CaptureState::Initializing,
            status: String::new(),
            facing: FacingMode::Environment,
            audio_enabled: true,
            stream: None,
            pose: None,
            pose_failures: 0,
            detector: None,
            meter: LiveMeter::new(),
            buffer: Arc::new(Mutex::new(RollingBuffer::new(1))),
            buffer_started: false,
            recorder: None,
            impact_latched: false,
            post_impact_deadline: None,
            video_recorded_fired: false,
            closed: false,
            last_error: None,
            metrics: CaptureMetrics::default(),
            events,
        };
        let _ = session.events.send(SessionEvent::OverlayVisibility(true));
        session.start_sensors();
        (session, receiver)
    }

    /// One detection tick. Returns the state after any committed transition.
    pub fn tick(&mut self) -> CaptureState {
        if self.closed || self.state == CaptureState::Error {
            return self.state;
        }
        self.metrics.ticks += 1;
        let mut transitioned = false;

        // Pose evaluation, suspended once armed.
        if !self.state.is_armed() && self.state != CaptureState::Initializing {
            transitioned = self.pose_tick();
        }

        // Audio sampling runs every tick once initialized so the level
        // meter is live before recording starts.
        let level = self.detector.as_mut().map(ImpactDetector::sample);
        if let Some(level) = level {
            if level > self.metrics.peak_level {
                self.metrics.peak_level = level;
            }
        }

        // Impact check, only once armed and only if no pose transition
        // committed this tick.
        if !transitioned
            && self.state == CaptureState::ReadyToCapture
            && !self.impact_latched
        {
            if let Some(level) = level {
                if ImpactDetector::is_impact(level, self.impact_threshold) {
                    self.latch_impact(level);
                    transitioned = true;
                }
            }
        }

        if !transitioned && self.state == CaptureState::Recording {
            if let Some(deadline) = self.post_impact_deadline {
                if self.clock.now() >= deadline {
                    self.finish_capture();
                }
            }
        }

        self.state
    }

    /// Tear down everything unconditionally: recorder, pending deadline,
    /// sensor stream, pose estimator. Safe from every state, including
    /// `Error` and mid-init, and idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.stop();
        }
        self.recorder = None;
        self.post_impact_deadline = None;
        self.lock_buffer().freeze();
        if let Some(stream) = self.stream.as_mut() {
            stream.release();
        }
        self.stream = None;
        self.pose = None;
        self.detector = None;
        let _ = self.events.send(SessionEvent::OverlayVisibility(false));
        let _ = self.events.send(SessionEvent::Closed);
        debug!("capture session closed");
    }

    /// Switch the physical camera. Treated as closing and reopening the
    /// session: the stream is released and re-acquired with the flipped
    /// facing mode and capture restarts from the beginning.
    pub fn switch_camera(&mut self) {
        if self.closed {
            return;
        }
        self.facing = self.facing.flipped();
        info!(facing = self.facing.label(), "switching camera, restarting session");
        self.start_sensors();
    }

    /// Retry after an acquisition error.
    pub fn retry(&mut self) {
        if self.closed || self.state != CaptureState::Error {
            return;
        }
        self.start_sensors();
    }

    /// Discard the captured clip and capture again.
    pub fn retake(&mut self) {
        if self.closed || self.state != CaptureState::Captured {
            return;
        }
        self.start_sensors();
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn status_message(&self) -> &str {
        &self.status
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    /// Live normalized sound level for the UI meter.
    pub fn meter(&self) -> LiveMeter {
        self.meter.clone()
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    /// Governs whether the sound-level UI is shown; analysis keeps running
    /// either way.
    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.audio_enabled = enabled;
    }

    pub fn impact_threshold(&self) -> f32 {
        self.impact_threshold
    }

    /// Adjust trigger sensitivity mid-session. Clamped inside (0, 1).
    pub fn set_impact_threshold(&mut self, threshold: f32) {
        self.impact_threshold = threshold.clamp(0.01, 0.99);
    }

    /// Whether the host UI should hide navigation behind the capture
    /// overlay. Session-scoped, true from open until close.
    pub fn overlay_visible(&self) -> bool {
        !self.closed
    }

    pub fn last_error(&self) -> Option<&AcquireError> {
        self.last_error.as_ref()
    }

    pub fn metrics(&self) -> CaptureMetrics {
        let mut metrics = self.metrics.clone();
        if let Some(stream) = &self.stream {
            metrics.frames_dropped = stream.frames_dropped();
        }
        metrics
    }

    fn start_sensors(&mut self) {
        self.transition(CaptureState::Initializing, "Requesting camera access...");
        self.last_error = None;
        self.buffer_started = false;
        self.impact_latched = false;
        self.video_recorded_fired = false;
        self.post_impact_deadline = None;
        self.pose_failures = 0;
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.stop();
        }
        self.recorder = None;
        if let Some(stream) = self.stream.as_mut() {
            stream.release();
        }
        self.stream = None;
        self.detector = None;
        self.pose = None;

        let request = StreamRequest {
            facing: self.facing,
            ideal_width: self.config.ideal_width,
            ideal_height: self.config.ideal_height,
            audio: true,
        };
        let stream = match self.host.acquire(&request) {
            Ok(stream) => stream,
            Err(err) => {
                warn!(reason = err.label(), error = %err, "sensor acquisition failed");
                let hint = err.user_hint();
                self.last_error = Some(err);
                self.transition(CaptureState::Error, &hint);
                return;
            }
        };

        self.detector = stream
            .audio_frames()
            .map(|frames| ImpactDetector::new(frames, self.meter.clone()));

        self.pose = self.pose_factory.as_ref().and_then(|factory| {
            let factory = factory.clone();
            pose::initialize_with_timeout(move || factory(), self.config.pose_init_timeout())
        });

        if self.detector.is_none() && self.pose.is_none() {
            // Neither trigger source exists: promoted to a fatal
            // acquisition error.
            let err = AcquireError::DeviceNotFound(
                "stream has no audio track and pose detection is unavailable".to_string(),
            );
            warn!(error = %err, "no trigger source available");
            let hint = err.user_hint();
            self.last_error = Some(err);
            self.stream = Some(stream);
            self.transition(CaptureState::Error, &hint);
            return;
        }

        self.stream = Some(stream);
        if self.pose.is_some() {
            self.transition(CaptureState::WaitingForGolfer, "Position yourself in frame");
        } else {
            info!("pose detection unavailable, using sound-only mode");
            self.transition(
                CaptureState::ReadyToCapture,
                "Ready - Swing when ready! (Sound detection)",
            );
            self.start_buffer();
        }
    }

    /// Run pose inference for this tick and apply at most one transition.
    fn pose_tick(&mut self) -> bool {
        let Some(estimator) = self.pose.as_mut() else {
            return false;
        };
        let Some(frame) = self.stream.as_mut().and_then(|s| s.video_frame()) else {
            // No frame this tick; treat as no pose data and continue.
            return false;
        };

        match estimator.infer(&frame, self.clock.now()) {
            Ok(pose_frame) => {
                self.pose_failures = 0;
                let status = pose::analyze(&pose_frame);
                match state::pose_transition(self.state, status) {
                    Some(CaptureState::WaitingForGolfer) => {
                        self.transition(CaptureState::WaitingForGolfer, "Position yourself in frame");
                        true
                    }
                    Some(CaptureState::GolferDetected) => {
                        self.transition(CaptureState::GolferDetected, "Get into address position");
                        true
                    }
                    Some(CaptureState::ReadyToCapture) => {
                        self.transition(CaptureState::ReadyToCapture, "Ready - Swing when ready!");
                        self.start_buffer();
                        true
                    }
                    _ => false,
                }
            }
            Err(err) => {
                self.pose_failures += 1;
                self.metrics.pose_failures += 1;
                debug!(error = %err, streak = self.pose_failures, "pose inference failed this tick");
                if self.pose_failures >= self.config.pose_failure_limit {
                    warn!("pose inference keeps failing, falling back to sound-only mode");
                    self.pose = None;
                    let _ = self.events.send(SessionEvent::DegradedToAudioOnly);
                    self.transition(
                        CaptureState::ReadyToCapture,
                        "Ready - Swing when ready! (Sound detection)",
                    );
                    self.start_buffer();
                    return true;
                }
                false
            }
        }
    }

    /// Start the rolling buffer. Idempotent: the started-flag guard makes a
    /// second call a no-op.
    fn start_buffer(&mut self) {
        if self.buffer_started {
            return;
        }
        self.buffer_started = true;
        self.buffer = Arc::new(Mutex::new(RollingBuffer::new(self.config.max_slices)));
        let sink = SliceSink::new(self.buffer.clone());

        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        match stream.recorder() {
            Ok(mut recorder) => match recorder.start(self.config.slice_interval(), sink) {
                Ok(()) => {
                    debug!(mime = recorder.mime_type(), "buffer recording started");
                    self.recorder = Some(recorder);
                }
                Err(err) => warn!(error = %err, "recorder failed to start"),
            },
            Err(err) => warn!(error = %err, "recorder unavailable for this stream"),
        }
    }

    fn latch_impact(&mut self, level: f32) {
        self.impact_latched = true;
        let deadline = self.clock.now() + self.config.post_impact_window();
        self.post_impact_deadline = Some(deadline);
        info!(level, threshold = self.impact_threshold, "impact detected");
        self.transition(CaptureState::Recording, "Impact detected! Capturing...");
    }

    /// Post-impact window elapsed: stop the recorder, freeze the buffer,
    /// and finalize.
    fn finish_capture(&mut self) {
        self.post_impact_deadline = None;
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.stop();
        }
        let mime = self
            .recorder
            .as_ref()
            .map(|r| r.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let slices = {
            let mut buffer = self.lock_buffer();
            buffer.freeze();
            buffer.take_slices()
        };

        match clip::finalize(&slices, &mime) {
            Ok(clip) => {
                self.metrics.outcome = Some("captured".to_string());
                self.video_recorded_fired = true;
                self.transition(CaptureState::Captured, "Swing captured!");
                info!(
                    slices = slices.len(),
                    bytes = clip.bytes.len(),
                    mime = %clip.mime_type,
                    ticks = self.metrics.ticks,
                    "swing captured"
                );
                let _ = self.events.send(SessionEvent::VideoRecorded(clip));
            }
            Err(FinalizeError::EmptyBuffer) => {
                warn!("post-impact window elapsed with an empty buffer");
                self.metrics.outcome = Some("empty_capture".to_string());
                let _ = self.events.send(SessionEvent::CaptureFailed {
                    reason: "Capture failed - please try again".to_string(),
                });
                self.recorder = None;
                self.impact_latched = false;
                self.buffer_started = false;
                if self.pose.is_some() {
                    self.transition(CaptureState::WaitingForGolfer, "Position yourself in frame");
                } else {
                    self.transition(
                        CaptureState::ReadyToCapture,
                        "Ready - Swing when ready! (Sound detection)",
                    );
                    self.start_buffer();
                }
            }
        }
    }

    fn transition(&mut self, state: CaptureState, message: &str) {
        self.state = state;
        self.status = message.to_string();
        debug!(state = state.label(), message, "state transition");
        let _ = self.events.send(SessionEvent::StateChanged {
            state,
            message: message.to_string(),
        });
    }

    fn lock_buffer(&self) -> std::sync::MutexGuard<'_, RollingBuffer> {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}
