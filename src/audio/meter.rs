use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Lock-free shared sound level so a UI thread can render a live meter
/// without touching the detection loop. Values are normalized to [0, 1].
#[derive(Clone, Debug)]
pub struct LiveMeter {
    level_bits: Arc<AtomicU32>,
}

impl LiveMeter {
    pub fn new() -> Self {
        Self {
            level_bits: Arc::new(AtomicU32::new(0f32.to_bits())),
        }
    }

    pub fn set_level(&self, level: f32) {
        self.level_bits
            .store(level.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    pub fn level(&self) -> f32 {
        f32::from_bits(self.level_bits.load(Ordering::Relaxed))
    }
}

impl Default for LiveMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_defaults_to_silence() {
        assert_eq!(LiveMeter::new().level(), 0.0);
    }

    #[test]
    fn meter_updates_and_clamps() {
        let meter = LiveMeter::new();
        meter.set_level(0.4);
        assert_eq!(meter.level(), 0.4);
        meter.set_level(3.0);
        assert_eq!(meter.level(), 1.0);
    }

    #[test]
    fn clones_share_one_level() {
        let meter = LiveMeter::new();
        let view = meter.clone();
        meter.set_level(0.25);
        assert_eq!(view.level(), 0.25);
    }
}
