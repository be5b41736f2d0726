// src/config/store.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::config::model::{CONFIG_FILE_NAME, ConfigDocument, LOG_FILE_NAME, STATE_DIR_NAME};
use crate::errors::Result;

/// Filesystem layout of the tool's state directory inside a project.
#[derive(Debug, Clone)]
pub struct StatePaths {
    pub state_dir: PathBuf,
    pub config_file: PathBuf,
    pub log_file: PathBuf,
}

impl StatePaths {
    pub fn new(project_root: &Path) -> Self {
        let state_dir = project_root.join(STATE_DIR_NAME);
        Self {
            config_file: state_dir.join(CONFIG_FILE_NAME),
            log_file: state_dir.join(LOG_FILE_NAME),
            state_dir,
        }
    }
}

/// Reads and writes the persisted config document.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted document.
    ///
    /// Returns `None` when the file is absent, unreadable, or not valid
    /// JSON; the caller decides whether that means "use defaults" (startup)
    /// or "keep the previous configuration" (reload).
    pub fn load(&self) -> Option<ConfigDocument> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!("config file {:?} not readable: {err}", self.path);
                return None;
            }
        };
        let value: serde_json::Value = match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(err) => {
                debug!("config file {:?} is not valid JSON: {err}", self.path);
                return None;
            }
        };
        if !value.is_object() {
            debug!("config file {:?} is not a JSON object", self.path);
            return None;
        }
        match serde_json::from_value(value) {
            Ok(doc) => Some(doc),
            Err(err) => {
                debug!("config file {:?} is not a valid document: {err}", self.path);
                None
            }
        }
    }

    /// Persist a document, pretty-printed so it stays hand-editable.
    pub fn write(&self, doc: &ConfigDocument) -> Result<()> {
        let contents = serde_json::to_string_pretty(doc).context("serializing config document")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("writing config file at {:?}", self.path))
    }
}
