//! Frequency-domain sound level reduction for impact detection.

use super::meter::LiveMeter;
use super::{FFT_SIZE, SMOOTHING};
use crossbeam_channel::Receiver;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;

/// dB mapping range for normalizing bin magnitudes, matching the analyser
/// defaults the capture pipeline's threshold was tuned against.
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// Reduces the live audio stream to one normalized level per tick.
///
/// Mono frames arrive from the capture callback over a bounded channel.
/// `sample()` keeps the most recent analysis window, runs a Hann-windowed
/// forward FFT, maps each bin magnitude into [0, 1] over the dB range, and
/// returns the mean across bins blended with the previous level. The
/// detector carries no other state between ticks and never debounces; the
/// state machine latches the first threshold crossing.
pub struct ImpactDetector {
    frames: Receiver<Vec<f32>>,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    recent: VecDeque<f32>,
    level: f32,
    meter: LiveMeter,
}

impl ImpactDetector {
    pub fn new(frames: Receiver<Vec<f32>>, meter: LiveMeter) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let window = (0..FFT_SIZE)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / (FFT_SIZE - 1) as f32).cos()))
            .collect();
        Self {
            frames,
            fft,
            window,
            recent: VecDeque::with_capacity(FFT_SIZE * 2),
            level: 0.0,
            meter,
        }
    }

    /// Drain pending frames and recompute the normalized sound level.
    ///
    /// Runs every detection tick regardless of capture state so the UI meter
    /// is live before recording starts.
    pub fn sample(&mut self) -> f32 {
        for frame in self.frames.try_iter() {
            self.recent.extend(frame);
            while self.recent.len() > FFT_SIZE {
                self.recent.pop_front();
            }
        }

        let fresh = if self.recent.len() < FFT_SIZE {
            0.0
        } else {
            self.window_level()
        };

        self.level = SMOOTHING * self.level + (1.0 - SMOOTHING) * fresh;
        self.meter.set_level(self.level);
        self.level
    }

    /// Candidate impact: normalized level crossed the threshold.
    pub fn is_impact(level: f32, threshold: f32) -> bool {
        level > threshold
    }

    pub fn current_level(&self) -> f32 {
        self.level
    }

    fn window_level(&self) -> f32 {
        let mut spectrum: Vec<Complex<f32>> = self
            .recent
            .iter()
            .zip(&self.window)
            .map(|(&sample, &w)| Complex::new(sample * w, 0.0))
            .collect();
        self.fft.process(&mut spectrum);

        // Mean of per-bin normalized magnitudes over the first half of the
        // spectrum (the rest mirrors it for real input).
        let bins = FFT_SIZE / 2;
        let sum: f32 = spectrum[..bins]
            .iter()
            .map(|bin| {
                let scaled = (bin.norm() / FFT_SIZE as f32).max(1e-10);
                let db = 20.0 * scaled.log10();
                ((db - MIN_DB) / (MAX_DB - MIN_DB)).clamp(0.0, 1.0)
            })
            .sum();
        sum / bins as f32
    }
}
