//! Editor-under-test abstraction.
//!
//! Implementations provide different ways of producing a screenshot of the
//! editor window:
//! - `GvimEditor` spawns the real editor and an external capture script
//! - `MockEditor` renders a deterministic window for exercising the harness

pub mod gvim;
pub mod mock;

use std::path::Path;
use std::time::{Duration, Instant};

use crate::harness::types::{HarnessError, HarnessResult};

pub use gvim::GvimEditor;
pub use mock::{MockCounters, MockEditor, MockFramebuffer, MockWindow};

/// Poll interval for deadline-bounded waits
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Time budget shared by all steps of one scenario
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    limit: Duration,
}

impl Deadline {
    /// Start a budget of `limit` from now
    pub fn after(limit: Duration) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.limit
    }

    /// Time left before the deadline, zero once expired
    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.start.elapsed())
    }

    /// Timeout error for the step that overran
    pub fn timeout(&self, step: &str) -> HarnessError {
        HarnessError::Timeout {
            step: step.to_string(),
            limit: self.limit,
        }
    }
}

/// Trait for editors under test
pub trait Editor: Send {
    /// Short identifier for logs (e.g., "gvim", "mock")
    fn name(&self) -> &str;

    /// Start the editor with the full argument list
    fn launch(&mut self, args: &[String]) -> HarnessResult<()>;

    /// Block until the editor window can be captured
    fn await_ready(&mut self, deadline: Deadline) -> HarnessResult<()>;

    /// Write a PNG of the editor window to `path`
    fn capture_screenshot(&mut self, path: &Path, deadline: Deadline) -> HarnessResult<()>;

    /// Ask the editor to exit
    fn terminate(&mut self) -> HarnessResult<()>;

    /// Block until the editor process has fully exited
    fn wait_for_exit(&mut self, deadline: Deadline) -> HarnessResult<()>;
}

/// Launch the editor, capture its window to `output`, then shut it down.
///
/// The editor is terminated after every capture attempt, successful or not,
/// and the call returns only once it has exited. A capture error takes
/// precedence over an exit error.
pub fn launch_and_capture(
    editor: &mut dyn Editor,
    args: &[String],
    output: &Path,
    deadline: Deadline,
) -> HarnessResult<()> {
    editor.launch(args)?;
    tracing::debug!(editor = editor.name(), "editor launched");

    let captured = match editor.await_ready(deadline) {
        Ok(()) => editor.capture_screenshot(output, deadline),
        Err(e) => Err(e),
    };
    match &captured {
        Ok(()) => tracing::debug!(path = %output.display(), "screenshot captured"),
        Err(e) => tracing::debug!(error = %e, "capture failed"),
    }

    if let Err(e) = editor.terminate() {
        tracing::warn!(editor = editor.name(), error = %e, "failed to signal editor");
    }
    let exited = editor.wait_for_exit(deadline);
    tracing::debug!(editor = editor.name(), "editor terminated");

    captured?;
    exited
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_remaining_saturates() {
        let deadline = Deadline::after(Duration::ZERO);
        assert!(deadline.expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);

        let deadline = Deadline::after(Duration::from_secs(60));
        assert!(!deadline.expired());
        assert!(deadline.remaining() > Duration::from_secs(59));
    }

    #[test]
    fn test_capture_failure_still_terminates() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = MockEditor::new().fail_capture(true);
        let counters = editor.counters();

        let result = launch_and_capture(
            &mut editor,
            &["+WToggleClean".to_string()],
            &dir.path().join("shot.png"),
            Deadline::after(Duration::from_secs(5)),
        );

        assert!(matches!(result, Err(HarnessError::Capture(_))));
        assert_eq!(counters.launches(), 1);
        assert_eq!(counters.terminations(), 1);
        assert!(!dir.path().join("shot.png").exists());
    }

    #[test]
    fn test_launch_failure_is_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = MockEditor::new().fail_launch(true);
        let counters = editor.counters();

        let result = launch_and_capture(
            &mut editor,
            &[],
            &dir.path().join("shot.png"),
            Deadline::after(Duration::from_secs(5)),
        );

        assert!(matches!(result, Err(HarnessError::Launch(_))));
        assert_eq!(counters.terminations(), 0);
    }

    #[test]
    fn test_successful_capture_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        let mut editor = MockEditor::new();
        let counters = editor.counters();

        launch_and_capture(&mut editor, &[], &path, Deadline::after(Duration::from_secs(5))).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], &[0x89, 0x50, 0x4E, 0x47]);
        assert_eq!(counters.terminations(), 1);
    }
}
