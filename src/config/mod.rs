// src/config/mod.rs

//! Persisted configuration for watchrun.
//!
//! Responsibilities:
//! - Define the JSON-backed document and the resolved [`EffectiveConfig`]
//!   (`model.rs`).
//! - Load/write the document from the tool's state directory (`store.rs`).

pub mod model;
pub mod store;

pub use model::{
    CONFIG_FILE_NAME, ConfigDocument, DEFAULT_DEBOUNCE_DELAY_MS, DEFAULT_RESTART_DELAY_MS,
    EffectiveConfig, LOG_FILE_NAME, STATE_DIR_NAME, WATCH_ALL, WatchSpec, WatchValue,
};
pub use store::{ConfigStore, StatePaths};
