// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration loading

use qrscan::Config;
use std::io::Write;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(
        config.scanner.session_timeout_ms, 20_000,
        "Safety timeout should default to 20 seconds"
    );
    assert_eq!(config.camera.device_index, 0);
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "[camera]\ndevice_index = 2\n\n[scanner]\ntick_interval_ms = 50\n"
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.camera.device_index, 2);
    assert_eq!(config.scanner.tick_interval_ms, 50);
    // Unspecified values keep their defaults
    assert_eq!(config.scanner.session_timeout_ms, 20_000);
}

#[test]
fn test_load_rejects_bad_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[scanner\nbroken").unwrap();

    assert!(Config::load(&path).is_err());
}

#[test]
fn test_explicit_missing_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.toml");

    assert!(Config::load_or_default(Some(&path)).is_err());
}
