//! Headless swing capture against the system microphone.
//!
//! Opens a sound-only capture session, waits for the impact of club on
//! ball, and writes the captured clip plus a JSON metadata sidecar to the
//! output directory. Also hosts the threshold calibration flow.

mod calibrate;
mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use swingcap::clock::SystemClock;
use swingcap::sensor::mic::MicHost;
use swingcap::session::{CaptureMetrics, CaptureSession, CaptureState, SessionEvent};
use swingcap::{telemetry, CaptureConfig, Clip};

use crate::cli::AppConfig;

fn main() -> Result<()> {
    let app = AppConfig::parse();
    telemetry::init_tracing(app.logging_enabled());

    if app.list_input_devices {
        for name in MicHost::list_devices()? {
            println!("{name}");
        }
        return Ok(());
    }

    let capture = app.capture_config()?;
    if app.calibrate {
        return calibrate::run(app.input_device.as_deref(), &capture);
    }
    run_capture(&app, capture)
}

fn run_capture(app: &AppConfig, capture: CaptureConfig) -> Result<()> {
    let host = MicHost::new(app.input_device.as_deref(), capture.channel_capacity);
    let clock = Arc::new(SystemClock::new());
    let (mut session, events) = CaptureSession::open(Box::new(host), None, capture, clock);

    let tick = Duration::from_millis(app.tick_ms.max(1));
    let deadline = (app.max_wait_secs > 0)
        .then(|| Instant::now() + Duration::from_secs(app.max_wait_secs));

    loop {
        let state = session.tick();

        let mut captured = None;
        for event in events.try_iter() {
            match event {
                SessionEvent::StateChanged { message, .. } => println!("{message}"),
                SessionEvent::DegradedToAudioOnly => {
                    println!("Pose detection unavailable; continuing with sound triggering.");
                }
                SessionEvent::CaptureFailed { reason } => eprintln!("{reason}"),
                SessionEvent::VideoRecorded(clip) => captured = Some(clip),
                SessionEvent::OverlayVisibility(_) | SessionEvent::Closed => {}
            }
        }

        if let Some(clip) = captured {
            let metrics = session.metrics();
            session.close();
            return write_outputs(app, &clip, &metrics);
        }

        if state == CaptureState::Error {
            let hint = session.status_message().to_string();
            session.close();
            bail!("capture session failed: {hint}");
        }

        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                session.close();
                bail!("no swing captured within {} seconds", app.max_wait_secs);
            }
        }

        thread::sleep(tick);
    }
}

fn write_outputs(app: &AppConfig, clip: &Clip, metrics: &CaptureMetrics) -> Result<()> {
    fs::create_dir_all(&app.output)
        .with_context(|| format!("creating output directory {}", app.output.display()))?;

    let clip_path = app.output.join(&clip.suggested_filename);
    fs::write(&clip_path, &clip.bytes)
        .with_context(|| format!("writing clip to {}", clip_path.display()))?;

    let sidecar = clip_path.with_extension("json");
    let body = serde_json::to_string_pretty(metrics).context("serializing capture metrics")?;
    fs::write(&sidecar, body)
        .with_context(|| format!("writing metadata to {}", sidecar.display()))?;

    println!("Saved {}", clip_path.display());
    println!("Metadata {}", sidecar.display());
    Ok(())
}
