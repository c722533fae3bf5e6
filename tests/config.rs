//! Configuration system tests
//!
//! Tests for config paths and loading/saving the studio config.

use std::collections::BTreeMap;

use swatch::config::{EditorEnvironment, StudioConfig};
use swatch::config_paths;
use swatch::StudioError;

// ========================================================================
// Config Paths Tests
// ========================================================================

#[test]
fn test_config_dir_ends_with_app_name() {
    if let Some(dir) = config_paths::config_dir() {
        assert!(dir.ends_with("swatch"));
    }
}

#[test]
fn test_config_file_is_yaml_in_config_dir() {
    if let (Some(dir), Some(file)) = (config_paths::config_dir(), config_paths::config_file()) {
        assert_eq!(file.parent(), Some(dir.as_path()));
        assert_eq!(file.extension().and_then(|e| e.to_str()), Some("yaml"));
    }
}

#[test]
fn test_logs_dir_is_under_config_dir() {
    if let (Some(dir), Some(logs)) = (config_paths::config_dir(), config_paths::logs_dir()) {
        assert!(logs.starts_with(&dir));
    }
}

// ========================================================================
// Studio Config Tests
// ========================================================================

#[test]
fn test_defaults() {
    let config = StudioConfig::default();
    assert_eq!(config.debounce_ms, 300);
    assert_eq!(config.default_file_name, "App.tsx");
    assert_eq!(config.render_timeout_ms, 2000);
    assert_eq!(config.editor, EditorEnvironment::default());
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.yaml");

    let mut overrides = BTreeMap::new();
    overrides.insert("css".to_string(), "/workers/css.js".to_string());
    let config = StudioConfig {
        debounce_ms: 120,
        default_file_name: "Main.jsx".to_string(),
        render_timeout_ms: 500,
        editor: EditorEnvironment {
            overrides,
            ..EditorEnvironment::default()
        },
    };

    config.save_to(&path).unwrap();
    let loaded = StudioConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.editor.worker_url("css"), "/workers/css.js");
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = StudioConfig::load_from(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, StudioError::Io { .. }));
}

#[test]
fn test_load_invalid_yaml_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "debounce_ms: [not a number\n").unwrap();
    let err = StudioConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, StudioError::Config { .. }));
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn test_editor_section_may_be_partial() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "editor:\n  script_worker: /ts.js\n").unwrap();
    let config = StudioConfig::load_from(&path).unwrap();
    assert_eq!(config.editor.worker_url("typescript"), "/ts.js");
    assert_eq!(config.editor.worker_url("html"), "./editor.worker.js");
    assert_eq!(config.debounce_ms, 300);
}
