use std::path::Path;

use watchrun::config::{
    CONFIG_FILE_NAME, ConfigDocument, ConfigStore, DEFAULT_DEBOUNCE_DELAY_MS,
    DEFAULT_RESTART_DELAY_MS, EffectiveConfig, STATE_DIR_NAME, WatchSpec,
};

fn paths() -> watchrun::config::StatePaths {
    watchrun::config::StatePaths::new(Path::new("/tmp/project"))
}

fn doc(json: &str) -> ConfigDocument {
    serde_json::from_str(json).expect("document should parse")
}

#[test]
fn defaults_fill_every_missing_field() {
    let config = EffectiveConfig::resolve(None, None, &paths());

    assert_eq!(config.watch, WatchSpec::All);
    assert_eq!(config.debounce_delay_ms, DEFAULT_DEBOUNCE_DELAY_MS);
    assert_eq!(config.restart_delay_ms, DEFAULT_RESTART_DELAY_MS);
    assert!(!config.silent_logs);
    assert!(!config.save_logs);
    assert!(config.log_file_path.is_none());
    // The tool never reacts to its own writes.
    assert!(config.ignore.contains(&STATE_DIR_NAME.to_string()));
    assert!(config.ignore.contains(&CONFIG_FILE_NAME.to_string()));
}

#[test]
fn document_fields_override_defaults() {
    let doc = doc(
        r#"{
            "watch": ["src/*.js", "lib"],
            "ignore": ["node_modules"],
            "debounceDelayMs": 250,
            "restartDelayMs": 100,
            "silentLogs": true,
            "saveLogs": true
        }"#,
    );
    let p = paths();
    let config = EffectiveConfig::resolve(Some(&doc), None, &p);

    assert_eq!(
        config.watch,
        WatchSpec::Patterns(vec!["src/*.js".to_string(), "lib".to_string()])
    );
    assert_eq!(config.ignore[0], "node_modules");
    assert_eq!(config.debounce_delay_ms, 250);
    assert_eq!(config.restart_delay_ms, 100);
    assert!(config.silent_logs);
    assert!(config.save_logs);
    assert_eq!(config.log_file_path.as_deref(), Some(p.log_file.as_path()));
}

#[test]
fn malformed_fields_fall_back_individually() {
    let doc = doc(
        r#"{
            "watch": 42,
            "debounceDelayMs": "fast",
            "restartDelayMs": 250,
            "silentLogs": "yes"
        }"#,
    );
    let config = EffectiveConfig::resolve(Some(&doc), None, &paths());

    assert_eq!(config.watch, WatchSpec::All);
    assert_eq!(config.debounce_delay_ms, DEFAULT_DEBOUNCE_DELAY_MS);
    assert_eq!(config.restart_delay_ms, 250, "valid fields must survive");
    assert!(!config.silent_logs);
}

#[test]
fn watch_accepts_sentinel_and_single_pattern_strings() {
    let all = EffectiveConfig::resolve(Some(&doc(r#"{"watch": "ALL"}"#)), None, &paths());
    assert_eq!(all.watch, WatchSpec::All);

    let one = EffectiveConfig::resolve(Some(&doc(r#"{"watch": "src"}"#)), None, &paths());
    assert_eq!(one.watch, WatchSpec::Patterns(vec!["src".to_string()]));

    let empty = EffectiveConfig::resolve(Some(&doc(r#"{"watch": []}"#)), None, &paths());
    assert_eq!(empty.watch, WatchSpec::All);
}

#[test]
fn manual_silent_override_beats_persisted_value() {
    let persisted_off = doc(r#"{"silentLogs": false}"#);
    let config = EffectiveConfig::resolve(Some(&persisted_off), Some(true), &paths());
    assert!(config.silent_logs);

    let persisted_on = doc(r#"{"silentLogs": true}"#);
    let config = EffectiveConfig::resolve(Some(&persisted_on), Some(false), &paths());
    assert!(!config.silent_logs);
}

#[test]
fn override_survives_unrelated_reload() {
    let p = paths();
    let first = doc(r#"{"silentLogs": false, "debounceDelayMs": 200}"#);
    let config = EffectiveConfig::resolve(Some(&first), Some(true), &p);
    assert!(config.silent_logs);

    // The user edits an unrelated field; the override still wins.
    let second = doc(r#"{"silentLogs": false, "debounceDelayMs": 900}"#);
    let config = EffectiveConfig::resolve(Some(&second), Some(true), &p);
    assert!(config.silent_logs);
    assert_eq!(config.debounce_delay_ms, 900);
}

#[test]
fn store_round_trips_the_default_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(CONFIG_FILE_NAME);
    let store = ConfigStore::new(path);

    store.write(&ConfigDocument::defaults()).expect("write");
    let loaded = store.load().expect("load");

    let p = paths();
    let from_disk = EffectiveConfig::resolve(Some(&loaded), None, &p);
    let from_defaults = EffectiveConfig::resolve(None, None, &p);
    assert_eq!(from_disk, from_defaults);
}

#[test]
fn absent_or_invalid_files_load_as_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(CONFIG_FILE_NAME);
    let store = ConfigStore::new(path.clone());

    assert!(store.load().is_none(), "absent file");

    std::fs::write(&path, "{ this is not json").expect("write");
    assert!(store.load().is_none(), "unparseable file");

    std::fs::write(&path, "[1, 2, 3]").expect("write");
    assert!(store.load().is_none(), "non-object document");
}
