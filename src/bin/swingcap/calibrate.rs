//! Threshold calibration: measure ambient and impact loudness and suggest a
//! trigger threshold sitting safely between them.

use anyhow::{anyhow, Result};
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};
use swingcap::audio::{ImpactDetector, LiveMeter};
use swingcap::sensor::{FacingMode, MediaStream, SensorHost, StreamRequest};
use swingcap::sensor::mic::MicHost;
use swingcap::CaptureConfig;

const RECOMMENDED_FLOOR: f32 = 0.05;
const RECOMMENDED_CEILING: f32 = 0.95;

const SAMPLE_INTERVAL: Duration = Duration::from_millis(20);
const AMBIENT_WINDOW: Duration = Duration::from_secs(2);
const IMPACT_WINDOW: Duration = Duration::from_secs(4);

const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';
const BAR_WIDTH: usize = 30;

pub(crate) fn run(device: Option<&str>, config: &CaptureConfig) -> Result<()> {
    let mut host = MicHost::new(device, config.channel_capacity);
    let request = StreamRequest {
        facing: FacingMode::Environment,
        ideal_width: config.ideal_width,
        ideal_height: config.ideal_height,
        audio: true,
    };
    let stream = host.acquire(&request)?;
    let frames = stream
        .audio_frames()
        .ok_or_else(|| anyhow!("acquired stream has no audio track"))?;
    let mut detector = ImpactDetector::new(frames, LiveMeter::new());

    println!("Calibrating impact threshold.");
    println!("Step 1/2: stay quiet while ambient noise is measured...");
    let ambient = measure_peak(&mut detector, AMBIENT_WINDOW)?;
    println!("  ambient peak {}  {:.3}", bar(ambient), ambient);

    println!("Step 2/2: make an impact sound (club strike, sharp clap)...");
    let impact = measure_peak(&mut detector, IMPACT_WINDOW)?;
    println!("  impact peak  {}  {:.3}", bar(impact), impact);

    let (suggested, warning) = recommend_threshold(ambient, impact);
    println!("Recommended threshold: {suggested:.2}");
    println!("Run with: swingcap --threshold {suggested:.2}");
    if let Some(warning) = warning {
        println!("Warning: {warning}");
    }
    Ok(())
}

/// Peak smoothed level seen over the window, with a live meter line.
fn measure_peak(detector: &mut ImpactDetector, window: Duration) -> Result<f32> {
    let started = Instant::now();
    let mut peak = 0.0_f32;
    let mut stdout = io::stdout();
    while started.elapsed() < window {
        let level = detector.sample();
        if level > peak {
            peak = level;
        }
        write!(stdout, "\r  {}  {level:.3}", bar(level))?;
        stdout.flush()?;
        thread::sleep(SAMPLE_INTERVAL);
    }
    write!(stdout, "\r{:width$}\r", "", width = BAR_WIDTH + 12)?;
    stdout.flush()?;
    Ok(peak)
}

fn bar(level: f32) -> String {
    let filled = ((level.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize).min(BAR_WIDTH);
    let mut out = String::with_capacity(BAR_WIDTH);
    for i in 0..BAR_WIDTH {
        out.push(if i < filled { BAR_FULL } else { BAR_EMPTY });
    }
    out
}

fn recommend_threshold(ambient: f32, impact: f32) -> (f32, Option<&'static str>) {
    if impact <= ambient {
        let suggested = (ambient + 0.02).clamp(RECOMMENDED_FLOOR, RECOMMENDED_CEILING);
        return (
            suggested,
            Some("The impact was not louder than ambient noise; triggering may be unreliable."),
        );
    }

    let margin = impact - ambient;
    let guard = if margin >= 0.4 {
        0.15
    } else if margin >= 0.2 {
        0.08
    } else {
        0.04
    };

    let mut suggested = ambient + guard;
    if suggested > impact - 0.02 {
        suggested = (ambient + impact) / 2.0;
    }

    let warning = if margin < 0.2 {
        Some("The impact is close to ambient noise; move the microphone nearer the ball.")
    } else {
        None
    };

    (suggested.clamp(RECOMMENDED_FLOOR, RECOMMENDED_CEILING), warning)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_margin_sits_above_ambient() {
        let (suggested, warning) = recommend_threshold(0.05, 0.8);
        assert!(suggested > 0.05 && suggested < 0.8);
        assert!(warning.is_none());
    }

    #[test]
    fn narrow_margin_warns_but_still_suggests() {
        let (suggested, warning) = recommend_threshold(0.10, 0.22);
        assert!(suggested > 0.10 && suggested < 0.22);
        assert!(warning.is_some());
    }

    #[test]
    fn inverted_levels_warn() {
        let (suggested, warning) = recommend_threshold(0.5, 0.3);
        assert!(warning.is_some());
        assert!(suggested >= RECOMMENDED_FLOOR && suggested <= RECOMMENDED_CEILING);
    }

    #[test]
    fn suggestion_never_leaves_the_usable_range() {
        let (suggested, _) = recommend_threshold(0.94, 0.96);
        assert!(suggested <= RECOMMENDED_CEILING);
        let (suggested, _) = recommend_threshold(0.0, 0.01);
        assert!(suggested >= RECOMMENDED_FLOOR);
    }
}
