//! Configuration loading: TOML strings, files on disk, defaults and failures.

use std::io::Write;

use bitemporal_core::config::{BitemporalConfig, TemporalConfig};
use bitemporal_core::ErrorKind;

// ── Defaults ─────────────────────────────────────────────────────────────

#[test]
fn empty_toml_yields_defaults() {
    let config = BitemporalConfig::from_toml("").unwrap();
    assert_eq!(config.temporal.processing_time_granularity_ms, 10);
    assert!(config.temporal.delete_on_changed_too_fast);
    assert!(config.temporal.inactivate_on_same_day_update);
    assert!(!config.temporal.stamp_business_to_on_inactivation);
    assert_eq!(config.temporal.inactivation_business_to_days, 1);
    assert!(!config.temporal.business_to_is_inclusive);
    assert_eq!(config.observability.log_filter, "info");
    assert!(!config.observability.json_logs);
}

#[test]
fn granularity_is_milliseconds() {
    let config = TemporalConfig {
        processing_time_granularity_ms: 250,
        ..TemporalConfig::default()
    };
    assert_eq!(config.processing_granularity().num_milliseconds(), 250);
}

// ── Partial overrides ────────────────────────────────────────────────────

#[test]
fn partial_section_keeps_other_defaults() {
    let config = BitemporalConfig::from_toml(
        r#"
        [temporal]
        inactivate_on_same_day_update = false
        business_to_is_inclusive = true

        [observability]
        json_logs = true
        "#,
    )
    .unwrap();
    assert!(!config.temporal.inactivate_on_same_day_update);
    assert!(config.temporal.business_to_is_inclusive);
    assert!(config.temporal.delete_on_changed_too_fast);
    assert!(config.observability.json_logs);
    assert_eq!(config.observability.log_filter, "info");
}

#[test]
fn wrong_type_is_rejected() {
    let err = BitemporalConfig::from_toml("[temporal]\nprocessing_time_granularity_ms = \"fast\"");
    assert!(err.is_err());
}

// ── Files ────────────────────────────────────────────────────────────────

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[temporal]\nstamp_business_to_on_inactivation = true\ninactivation_business_to_days = 3"
    )
    .unwrap();

    let config = BitemporalConfig::from_file(file.path()).unwrap();
    assert!(config.temporal.stamp_business_to_on_inactivation);
    assert_eq!(config.temporal.inactivation_business_to_days, 3);
}

#[test]
fn missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = BitemporalConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn unparsable_file_is_a_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[temporal").unwrap();
    let err = BitemporalConfig::from_file(file.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(!err.is_retryable());
}
