use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use swingcap::CaptureConfig;

#[derive(Debug, Parser, Clone)]
#[command(name = "swingcap", about = "Automatic golf swing capture", author, version)]
pub(crate) struct AppConfig {
    /// Input device name (substring match, first match wins)
    #[arg(long = "input-device", env = "SWINGCAP_INPUT_DEVICE")]
    pub(crate) input_device: Option<String>,

    /// List available input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub(crate) list_input_devices: bool,

    /// Impact trigger threshold, normalized level in (0, 1)
    #[arg(long = "threshold")]
    pub(crate) threshold: Option<f32>,

    /// Capture settings YAML file (missing keys fall back to defaults)
    #[arg(long = "config")]
    pub(crate) config: Option<PathBuf>,

    /// Directory the captured clip and its metadata sidecar are written to
    #[arg(long = "output", default_value = ".")]
    pub(crate) output: PathBuf,

    /// Write JSON trace logs (path via SWINGCAP_TRACE_LOG)
    #[arg(long = "logs", default_value_t = false)]
    pub(crate) logs: bool,

    /// Disable all trace logging, overriding --logs
    #[arg(long = "no-logs", default_value_t = false)]
    pub(crate) no_logs: bool,

    /// Measure ambient and impact loudness, recommend a threshold, and exit
    #[arg(long = "calibrate", default_value_t = false)]
    pub(crate) calibrate: bool,

    /// Give up when no swing is captured within this many seconds (0 = wait forever)
    #[arg(long = "max-wait-secs", default_value_t = 300)]
    pub(crate) max_wait_secs: u64,

    /// Detection tick interval in milliseconds
    #[arg(long = "tick-ms", default_value_t = 33)]
    pub(crate) tick_ms: u64,
}

impl AppConfig {
    pub(crate) fn logging_enabled(&self) -> bool {
        self.logs && !self.no_logs
    }

    /// Resolve the capture settings: YAML file if given, then flag
    /// overrides, then a full range validation.
    pub(crate) fn capture_config(&self) -> Result<CaptureConfig> {
        let mut capture = match &self.config {
            Some(path) => CaptureConfig::from_yaml_file(path)?,
            None => CaptureConfig::default(),
        };
        if let Some(threshold) = self.threshold {
            capture.impact_threshold = threshold;
        }
        capture.validate()?;
        Ok(capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_to_a_valid_config() {
        let app = AppConfig::parse_from(["swingcap"]);
        let capture = app.capture_config().unwrap();
        assert!((capture.impact_threshold - 0.15).abs() < f32::EPSILON);
    }

    #[test]
    fn threshold_flag_overrides_the_default() {
        let app = AppConfig::parse_from(["swingcap", "--threshold", "0.4"]);
        let capture = app.capture_config().unwrap();
        assert!((capture.impact_threshold - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let app = AppConfig::parse_from(["swingcap", "--threshold", "1.5"]);
        assert!(app.capture_config().is_err());
    }

    #[test]
    fn no_logs_wins_over_logs() {
        let app = AppConfig::parse_from(["swingcap", "--logs", "--no-logs"]);
        assert!(!app.logging_enabled());
    }
}
