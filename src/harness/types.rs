use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single visual test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// What the case verifies (e.g., "should look clean with the default theme")
    pub desc: String,

    /// Reference image filename, resolved under `<ref_dir>/<variant>/`
    #[serde(rename = "ref")]
    pub reference: String,

    /// Editor startup commands, appended after the fixed launch flags
    #[serde(default)]
    pub args: Vec<String>,
}

impl Scenario {
    /// Create a scenario from borrowed parts
    pub fn new(desc: &str, reference: &str, args: &[&str]) -> Self {
        Self {
            desc: desc.to_string(),
            reference: reference.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Label used when reporting the case (`@<index> <desc>`)
    pub fn label(&self, index: usize) -> String {
        format!("@{} {}", index, self.desc)
    }
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Error types for harness operations
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The host variant could not be determined; no scenario can run
    #[error("Environment detection failed: {0}")]
    Probe(String),

    /// The editor process could not be started or died before capture
    #[error("Launch error: {0}")]
    Launch(String),

    /// The screenshot capture script failed
    #[error("Capture error: {0}")]
    Capture(String),

    /// The screenshot differs from the reference beyond the threshold
    #[error("Visual difference of {percentage}% detected.")]
    Mismatch { percentage: f64 },

    /// A step did not finish within the scenario time limit
    #[error("Timed out after {limit:?} while {step}")]
    Timeout { step: String, limit: Duration },

    /// Image decode/encode error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed scenario file
    #[error("Scenario file error: {0}")]
    Scenario(#[from] serde_json::Error),
}

impl HarnessError {
    /// Whether the error aborts the whole suite rather than a single case
    pub fn is_fatal(&self) -> bool {
        matches!(self, HarnessError::Probe(_))
    }
}
