//! Per-run output directory management.
//!
//! Each suite execution gets a random run id and writes its artifacts under
//! `<output_root>/<run-id>/`, keyed by scenario index:
//! - `<index>-result.png` the captured screenshot
//! - `<index>-ref.png` a copy of the reference image
//! - `<index>-diff.png` the comparison visualisation
//!
//! Artifacts are kept after the run for inspection.

use std::fs;
use std::path::{Path, PathBuf};

/// Random bytes in a run id (rendered as twice as many hex digits)
const RUN_ID_BYTES: usize = 6;

/// Explicit run state passed into every scenario execution
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Hex run identifier
    pub id: String,
    /// `<output_root>/<id>`
    pub dir: PathBuf,
}

impl RunContext {
    /// Create a context with a fresh random id under `output_root`
    pub fn new(output_root: impl AsRef<Path>) -> Self {
        Self::with_id(output_root, generate_run_id())
    }

    /// Create a context with a caller-chosen id
    pub fn with_id(output_root: impl AsRef<Path>, id: impl Into<String>) -> Self {
        let id = id.into();
        let dir = output_root.as_ref().join(&id);
        Self { id, dir }
    }

    /// Create the run directory if absent. Safe to call repeatedly.
    pub fn init(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    /// Path of the captured screenshot for a scenario
    pub fn result_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}-result.png", index))
    }

    /// Path of the reference copy for a scenario
    pub fn reference_copy_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}-ref.png", index))
    }

    /// Path of the diff image for a scenario
    pub fn diff_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}-diff.png", index))
    }

    /// List all PNG artifacts in the run directory
    pub fn list_artifacts(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut artifacts = Vec::new();
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)? {
                let path = entry?.path();
                if path.extension().map(|e| e == "png").unwrap_or(false) {
                    artifacts.push(path);
                }
            }
        }
        artifacts.sort();
        Ok(artifacts)
    }
}

/// Generate a random hex run id
pub fn generate_run_id() -> String {
    let mut bytes = [0u8; RUN_ID_BYTES];
    for b in &mut bytes {
        *b = fastrand::u8(..);
    }
    hex::encode(bytes)
}
