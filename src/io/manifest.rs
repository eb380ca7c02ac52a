//! Run manifests.
//!
//! A manifest is the machine-readable record of one `ri` run:
//! - which command ran, with which inputs and read options
//! - every file the run wrote (tables and charts)
//! - when it ran
//!
//! It is written last, as `manifest.json` in the output directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::domain::ReadOptions;
use crate::error::AppError;
use crate::io::export::write_atomic;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub tool: String,
    pub version: String,
    pub command: String,
    pub generated_at: DateTime<Local>,
    #[serde(default)]
    pub read: ReadOptions,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
}

impl RunManifest {
    pub fn new(command: &str) -> Self {
        Self {
            tool: "ri".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            command: command.to_string(),
            generated_at: Local::now(),
            read: ReadOptions::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn record_input(&mut self, path: &Path) {
        if !self.inputs.iter().any(|p| p == path) {
            self.inputs.push(path.to_path_buf());
        }
    }

    pub fn record_output(&mut self, path: &Path) {
        if !self.outputs.iter().any(|p| p == path) {
            self.outputs.push(path.to_path_buf());
        }
    }

    /// Fold another run's inputs/outputs into this one (used by `ri all`).
    pub fn absorb(&mut self, other: RunManifest) {
        if !other.inputs.is_empty() {
            self.read = other.read;
        }
        for p in &other.inputs {
            self.record_input(p);
        }
        for p in &other.outputs {
            self.record_output(p);
        }
    }
}

/// Write `manifest.json` into `out_dir` and return its path.
pub fn write_manifest(out_dir: &Path, manifest: &RunManifest) -> Result<PathBuf, AppError> {
    let path = out_dir.join(MANIFEST_FILE);
    let bytes = serde_json::to_vec_pretty(manifest)
        .map_err(|e| AppError::output(format!("Failed to serialize run manifest: {e}")))?;
    write_atomic(&path, &bytes)?;
    Ok(path)
}
