//! Types for suite run results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Final state of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Passed,
    Failed,
}

/// Result of a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Position in the scenario list; keys the artifact filenames
    pub index: usize,

    /// `@<index> <desc>`
    pub label: String,

    /// Reference image the screenshot was compared against
    pub reference: PathBuf,

    /// Captured screenshot (present once capture succeeded)
    pub result_path: Option<PathBuf>,

    /// Diff image (present once comparison ran)
    pub diff_path: Option<PathBuf>,

    /// Mismatch percentage (None if the comparison never ran)
    pub mismatch_percentage: Option<f64>,

    pub status: Status,

    /// Error message if failed
    pub error: Option<String>,

    pub elapsed_ms: u64,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.status == Status::Passed
    }
}

/// Result of a complete suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,

    pub output_dir: PathBuf,

    /// Reference variant the run used
    pub variant: String,

    pub started: DateTime<Utc>,

    pub scenarios: Vec<ScenarioReport>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.scenarios.len() - self.passed()
    }

    /// Whether every scenario passed
    pub fn success(&self) -> bool {
        self.failed() == 0
    }
}
