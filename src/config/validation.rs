use super::CaptureConfig;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

impl CaptureConfig {
    /// Load overrides from a YAML file and validate them right away.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values and keep overrides inside safe ranges.
    pub fn validate(&self) -> Result<()> {
        if !(100..=5_000).contains(&self.slice_ms) {
            bail!("slice_ms must be between 100 and 5000, got {}", self.slice_ms);
        }
        if !(1..=120).contains(&self.max_slices) {
            bail!("max_slices must be between 1 and 120, got {}", self.max_slices);
        }
        if !(1..=10_000).contains(&self.post_impact_ms) {
            bail!(
                "post_impact_ms must be between 1 and 10000, got {}",
                self.post_impact_ms
            );
        }
        if !(self.impact_threshold > 0.0 && self.impact_threshold < 1.0) {
            bail!(
                "impact_threshold must be strictly between 0 and 1, got {}",
                self.impact_threshold
            );
        }
        if self.pose_init_timeout_ms > 30_000 {
            bail!(
                "pose_init_timeout_ms must be at most 30000, got {}",
                self.pose_init_timeout_ms
            );
        }
        if self.pose_failure_limit == 0 {
            bail!("pose_failure_limit must be at least 1");
        }
        if self.ideal_width == 0 || self.ideal_height == 0 {
            bail!(
                "ideal resolution must be nonzero, got {}x{}",
                self.ideal_width,
                self.ideal_height
            );
        }
        if !(8..=1_024).contains(&self.channel_capacity) {
            bail!(
                "channel_capacity must be between 8 and 1024, got {}",
                self.channel_capacity
            );
        }
        Ok(())
    }
}
