// src/config/model.rs

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::store::StatePaths;

/// Name of the tool's own state directory inside the project root.
pub const STATE_DIR_NAME: &str = ".watchrun";
/// Config document filename inside the state directory.
pub const CONFIG_FILE_NAME: &str = "config.json";
/// Log mirror filename inside the state directory.
pub const LOG_FILE_NAME: &str = "watchrun.log";
/// Sentinel watch value meaning "everything that is not ignored".
pub const WATCH_ALL: &str = "all";

pub const DEFAULT_DEBOUNCE_DELAY_MS: u64 = 500;
pub const DEFAULT_RESTART_DELAY_MS: u64 = 0;

/// Raw persisted document, as read from `config.json`.
///
/// Every field is optional and individually lenient: a key holding a value
/// of the wrong JSON type falls back to its default instead of failing the
/// whole document. Only a file that is not a JSON object at all is rejected
/// (see [`crate::config::ConfigStore::load`]).
///
/// ```json
/// {
///   "watch": ["src/*.js", "lib"],
///   "ignore": ["node_modules"],
///   "debounceDelayMs": 500,
///   "restartDelayMs": 0,
///   "silentLogs": false,
///   "saveLogs": true
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigDocument {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub watch: Option<WatchValue>,

    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub ignore: Option<Vec<String>>,

    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub debounce_delay_ms: Option<u64>,

    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub restart_delay_ms: Option<u64>,

    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub silent_logs: Option<bool>,

    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub save_logs: Option<bool>,
}

impl ConfigDocument {
    /// Fully-populated document with the built-in defaults, written to the
    /// state directory on first start so the file can be edited live.
    pub fn defaults() -> Self {
        Self {
            watch: Some(WatchValue::Sentinel(WATCH_ALL.to_string())),
            ignore: Some(Vec::new()),
            debounce_delay_ms: Some(DEFAULT_DEBOUNCE_DELAY_MS),
            restart_delay_ms: Some(DEFAULT_RESTART_DELAY_MS),
            silent_logs: Some(false),
            save_logs: Some(false),
        }
    }
}

/// The `watch` key accepts either the `"all"` sentinel (or a single
/// pattern) or an ordered list of patterns.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WatchValue {
    Sentinel(String),
    Patterns(Vec<String>),
}

/// Accept a value of the expected type, or fall back to the field default on
/// a type mismatch rather than rejecting the document.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(T::deserialize(value).ok())
}

/// Resolved watch specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchSpec {
    /// Everything not ignored is accepted.
    All,
    /// Only paths matching at least one pattern are accepted.
    Patterns(Vec<String>),
}

/// The configuration in force at a given instant.
///
/// Built once at startup from the persisted document merged over defaults,
/// and rebuilt wholesale on every detected config-file change. A manual
/// silent-mode override from the runtime console takes precedence over the
/// persisted `silentLogs` on every rebuild until the process exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub watch: WatchSpec,
    /// Always ends with the state-directory name and the config filename,
    /// so the watcher never reacts to the tool's own writes.
    pub ignore: Vec<String>,
    pub debounce_delay_ms: u64,
    pub restart_delay_ms: u64,
    pub silent_logs: bool,
    pub save_logs: bool,
    /// Present iff `save_logs`.
    pub log_file_path: Option<PathBuf>,
}

impl EffectiveConfig {
    /// Merge a persisted document (or nothing) over the defaults.
    ///
    /// `silent_override` is the console-toggled silent mode; when set it
    /// wins over the persisted value.
    pub fn resolve(
        doc: Option<&ConfigDocument>,
        silent_override: Option<bool>,
        paths: &StatePaths,
    ) -> Self {
        let fallback = ConfigDocument::default();
        let doc = doc.unwrap_or(&fallback);

        let watch = match &doc.watch {
            None => WatchSpec::All,
            Some(WatchValue::Sentinel(s)) if s.eq_ignore_ascii_case(WATCH_ALL) => WatchSpec::All,
            Some(WatchValue::Sentinel(s)) => WatchSpec::Patterns(vec![s.clone()]),
            // An empty list is treated as unspecified; nothing would ever
            // match otherwise.
            Some(WatchValue::Patterns(p)) if p.is_empty() => WatchSpec::All,
            Some(WatchValue::Patterns(p)) => WatchSpec::Patterns(p.clone()),
        };

        let mut ignore = doc.ignore.clone().unwrap_or_default();
        ignore.push(STATE_DIR_NAME.to_string());
        ignore.push(CONFIG_FILE_NAME.to_string());

        let silent_logs = silent_override.unwrap_or_else(|| doc.silent_logs.unwrap_or(false));
        let save_logs = doc.save_logs.unwrap_or(false);
        let log_file_path = save_logs.then(|| paths.log_file.clone());

        Self {
            watch,
            ignore,
            debounce_delay_ms: doc.debounce_delay_ms.unwrap_or(DEFAULT_DEBOUNCE_DELAY_MS),
            restart_delay_ms: doc.restart_delay_ms.unwrap_or(DEFAULT_RESTART_DELAY_MS),
            silent_logs,
            save_logs,
            log_file_path,
        }
    }
}
