use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

#[cfg(windows)]
use std::os::windows::process::CommandExt;

use super::{Deadline, Editor, POLL_INTERVAL};
use crate::config::EditorSettings;
use crate::harness::types::{HarnessError, HarnessResult};

/// Real editor process captured by an external script
///
/// On Windows the arguments are passed verbatim so that quoted Ex commands
/// reach gvim unchanged; elsewhere their quoting is stripped first.
pub struct GvimEditor {
    settings: EditorSettings,
    child: Option<Child>,
}

impl GvimEditor {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            settings,
            child: None,
        }
    }

    fn capture_command(&self, path: &Path) -> Command {
        let mut parts = self.settings.capture_shell.iter();
        let mut cmd = match parts.next() {
            Some(shell) => {
                let mut cmd = Command::new(shell);
                cmd.args(parts);
                cmd.arg(&self.settings.capture_script);
                cmd
            }
            None => Command::new(&self.settings.capture_script),
        };
        cmd.arg(path);
        cmd
    }
}

impl Editor for GvimEditor {
    fn name(&self) -> &str {
        "gvim"
    }

    fn launch(&mut self, args: &[String]) -> HarnessResult<()> {
        let mut cmd = Command::new(&self.settings.binary);
        for arg in args {
            #[cfg(windows)]
            cmd.raw_arg(arg);
            #[cfg(not(windows))]
            cmd.arg(crate::launch::unquote_verbatim(arg));
        }
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| {
            HarnessError::Launch(format!(
                "failed to spawn '{}': {}",
                self.settings.binary.display(),
                e
            ))
        })?;
        tracing::debug!(pid = child.id(), "spawned editor");
        self.child = Some(child);
        Ok(())
    }

    fn await_ready(&mut self, deadline: Deadline) -> HarnessResult<()> {
        let settle = self.settings.settle.min(deadline.remaining());
        if !settle.is_zero() {
            thread::sleep(settle);
        }

        let child = self
            .child
            .as_mut()
            .ok_or_else(|| HarnessError::Launch("editor is not running".to_string()))?;
        if let Some(status) = child.try_wait()? {
            self.child = None;
            return Err(HarnessError::Launch(format!(
                "editor exited with {} before capture",
                status
            )));
        }
        Ok(())
    }

    fn capture_screenshot(&mut self, path: &Path, deadline: Deadline) -> HarnessResult<()> {
        let mut capture = self
            .capture_command(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                HarnessError::Capture(format!(
                    "failed to run capture script '{}': {}",
                    self.settings.capture_script.display(),
                    e
                ))
            })?;

        let stderr = drain_stderr(&mut capture);

        let status = match wait_until(&mut capture, deadline)? {
            Some(status) => status,
            None => {
                let _ = capture.kill();
                let _ = capture.wait();
                return Err(deadline.timeout("capturing screenshot"));
            }
        };

        if !status.success() {
            let stderr = stderr.and_then(|h| h.join().ok()).unwrap_or_default();
            return Err(HarnessError::Capture(format!(
                "capture script exited with {}: {}",
                status,
                stderr.trim()
            )));
        }

        if !path.exists() {
            return Err(HarnessError::Capture(format!(
                "capture script did not produce {}",
                path.display()
            )));
        }
        Ok(())
    }

    fn terminate(&mut self) -> HarnessResult<()> {
        let Some(child) = self.child.as_mut() else {
            return Ok(());
        };
        if child.try_wait()?.is_some() {
            return Ok(());
        }

        #[cfg(unix)]
        {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;

            kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).map_err(std::io::Error::from)?;
        }
        #[cfg(not(unix))]
        child.kill()?;

        Ok(())
    }

    fn wait_for_exit(&mut self, deadline: Deadline) -> HarnessResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        match wait_until(&mut child, deadline)? {
            Some(status) => {
                tracing::debug!(%status, "editor exited");
                Ok(())
            }
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(deadline.timeout("waiting for editor to exit"))
            }
        }
    }
}

impl Drop for GvimEditor {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Read a child's stderr to the end on a helper thread, so a noisy child
/// never blocks on a full pipe
fn drain_stderr(child: &mut Child) -> Option<JoinHandle<String>> {
    let mut pipe = child.stderr.take()?;
    Some(thread::spawn(move || {
        let mut bytes = Vec::new();
        let _ = pipe.read_to_end(&mut bytes);
        String::from_utf8_lossy(&bytes).into_owned()
    }))
}

/// Poll a child until it exits or the deadline passes (`None`)
fn wait_until(child: &mut Child, deadline: Deadline) -> HarnessResult<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if deadline.expired() {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline.remaining()));
    }
}
