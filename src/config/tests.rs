use super::CaptureConfig;

#[test]
fn defaults_pass_validation() {
    CaptureConfig::default().validate().unwrap();
}

#[test]
fn default_window_covers_five_seconds() {
    let config = CaptureConfig::default();
    assert_eq!(config.slice_ms * config.max_slices as u64, 5_000);
}

#[test]
fn threshold_bounds_are_exclusive() {
    let mut config = CaptureConfig::default();
    config.impact_threshold = 0.0;
    assert!(config.validate().is_err());
    config.impact_threshold = 1.0;
    assert!(config.validate().is_err());
    config.impact_threshold = 0.999;
    assert!(config.validate().is_ok());
}

#[test]
fn slice_duration_is_range_checked() {
    let mut config = CaptureConfig::default();
    config.slice_ms = 50;
    assert!(config.validate().is_err());
    config.slice_ms = 10_000;
    assert!(config.validate().is_err());
}

#[test]
fn zero_resolution_is_rejected() {
    let mut config = CaptureConfig::default();
    config.ideal_width = 0;
    assert!(config.validate().is_err());
}

#[test]
fn yaml_overrides_merge_with_defaults() {
    let parsed: CaptureConfig =
        serde_yaml::from_str("impact_threshold: 0.3\nmax_slices: 6\n").unwrap();
    assert_eq!(parsed.max_slices, 6);
    assert!((parsed.impact_threshold - 0.3).abs() < 1e-6);
    assert_eq!(parsed.slice_ms, super::DEFAULT_SLICE_MS);
    parsed.validate().unwrap();
}

#[test]
fn pose_failure_limit_must_be_positive() {
    let mut config = CaptureConfig::default();
    config.pose_failure_limit = 0;
    assert!(config.validate().is_err());
}
