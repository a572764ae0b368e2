//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Shared primitives and utilities for the core runtime."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fs;

use oadr_common::{init_tracing, AppConfig, LogFormat, LoggingConfig};
use oadr_model::{ErrorMode, UnknownVariantPolicy};
use tempfile::tempdir;

const LENIENT: &str = r#"
[decode]
error_mode = "accumulate"
unknown_payload_descriptor = "skip"

[logging]
format = "pretty"
file_prefix = "oadr-test"
"#;

#[test]
fn config_loading_honours_candidates_and_env_override() {
    let dir = tempdir().expect("temp dir");
    let missing = dir.path().join("missing.toml");
    let lenient = dir.path().join("lenient.toml");
    let strict = dir.path().join("strict.toml");
    fs::write(&lenient, LENIENT).expect("write lenient");
    fs::write(&strict, "[decode]\nerror_mode = \"fail-fast\"\n").expect("write strict");

    std::env::remove_var(AppConfig::ENV_CONFIG_PATH);
    let loaded = AppConfig::load_with_source(&[&missing, &lenient]).expect("load");
    assert_eq!(loaded.source.as_deref(), Some(lenient.as_path()));
    assert_eq!(loaded.config.decode.error_mode, ErrorMode::Accumulate);
    assert_eq!(loaded.config.decode.unknown_payload_descriptor, UnknownVariantPolicy::Skip);
    assert_eq!(loaded.config.logging.format, LogFormat::Pretty);

    let defaults = AppConfig::load_with_source(&[&missing]).expect("defaults");
    assert!(defaults.source.is_none());
    assert_eq!(defaults.config, AppConfig::default());

    std::env::set_var(AppConfig::ENV_CONFIG_PATH, &strict);
    let overridden = AppConfig::load(&[&lenient]);
    std::env::set_var(AppConfig::ENV_CONFIG_PATH, &missing);
    let broken = AppConfig::load(&[&lenient]);
    std::env::remove_var(AppConfig::ENV_CONFIG_PATH);

    assert_eq!(overridden.expect("override").decode.error_mode, ErrorMode::FailFast);
    let err = broken.expect_err("override must exist");
    assert!(err.to_string().contains("unable to read config file"), "{err:#}");
}

#[test]
fn invalid_file_reports_its_path() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[decode]\nerror_mode = \"sometimes\"\n").expect("write");
    let err = AppConfig::from_path(&path).expect_err("invalid mode");
    assert!(err.to_string().contains("bad.toml"), "{err:#}");
}

#[test]
fn log_directory_must_not_be_a_file() {
    let dir = tempdir().expect("temp dir");
    let file = dir.path().join("not-a-dir");
    fs::write(&file, "").expect("write");
    let config = LoggingConfig {
        directory: Some(file),
        ..LoggingConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn tracing_creates_the_log_directory() {
    let dir = tempdir().expect("temp dir");
    let logs = dir.path().join("logs");
    let config = LoggingConfig {
        format: LogFormat::StructuredJson,
        directory: Some(logs.clone()),
        file_prefix: Some("oadr-test".into()),
    };
    init_tracing("oadr-test", &config).expect("init");
    init_tracing("oadr-test", &config).expect("second init is harmless");
    assert!(logs.is_dir());
}
