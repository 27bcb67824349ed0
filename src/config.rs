//! Configuration management with environment variable support.
//!
//! Every setting the harness needs can be overridden from the environment,
//! falling back to the values the `:WToggleClean` suite was written against.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `VIM_VISUAL_EDITOR` | Editor binary to launch | `gvim` |
//! | `VIM_VISUAL_CAPTURE_SCRIPT` | Screenshot capture script | `./test/Take-Vim-Screenshot.ps1` |
//! | `VIM_VISUAL_CAPTURE_SHELL` | Interpreter prefix for the capture script | `powershell -ep Bypass` |
//! | `VIM_VISUAL_PLUGIN_PATH` | Plugin directory added to `runtimepath` | current directory |
//! | `VIM_VISUAL_OUTPUT_DIR` | Root of per-run output directories | `test-output` |
//! | `VIM_VISUAL_REF_DIR` | Root of reference images | `test/ref` |
//! | `VIM_VISUAL_THRESHOLD` | Maximum passing mismatch percentage | `0.01` |
//! | `VIM_VISUAL_TIMEOUT_MS` | Per-scenario time limit (ms) | `5000` |
//! | `VIM_VISUAL_SETTLE_MS` | Delay between launch and capture (ms) | `0` |
//! | `VIM_VISUAL_VARIANT` | Pin the reference variant (`server`/`desktop`) | probe |
//! | `VIM_VISUAL_TITLE` | Window title set in the editor | `wimproved.vim` |
//!
//! # Example
//!
//! ```bash
//! # Run against a Linux gvim with a shell-based capture script
//! export VIM_VISUAL_VARIANT=desktop
//! export VIM_VISUAL_CAPTURE_SHELL=sh
//! export VIM_VISUAL_CAPTURE_SCRIPT=./test/take-vim-screenshot.sh
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use crate::compare::DEFAULT_THRESHOLD;
use crate::probe::Variant;

// ============================================================================
// Default Values
// ============================================================================

/// Default editor binary
pub const DEFAULT_EDITOR: &str = "gvim";

/// Default screenshot capture script
pub const DEFAULT_CAPTURE_SCRIPT: &str = "./test/Take-Vim-Screenshot.ps1";

/// Default interpreter used to run the capture script
pub const DEFAULT_CAPTURE_SHELL: &str = "powershell -ep Bypass";

/// Default root for run output directories
pub const DEFAULT_OUTPUT_DIR: &str = "test-output";

/// Default root for reference images
pub const DEFAULT_REF_DIR: &str = "test/ref";

/// Default per-scenario time limit (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default settle delay between launch and capture (milliseconds)
pub const DEFAULT_SETTLE_MS: u64 = 0;

/// Default window title
pub const DEFAULT_TITLE: &str = "wimproved.vim";

// ============================================================================
// Environment Variable Names
// ============================================================================

pub const ENV_EDITOR: &str = "VIM_VISUAL_EDITOR";
pub const ENV_CAPTURE_SCRIPT: &str = "VIM_VISUAL_CAPTURE_SCRIPT";
pub const ENV_CAPTURE_SHELL: &str = "VIM_VISUAL_CAPTURE_SHELL";
pub const ENV_PLUGIN_PATH: &str = "VIM_VISUAL_PLUGIN_PATH";
pub const ENV_OUTPUT_DIR: &str = "VIM_VISUAL_OUTPUT_DIR";
pub const ENV_REF_DIR: &str = "VIM_VISUAL_REF_DIR";
pub const ENV_THRESHOLD: &str = "VIM_VISUAL_THRESHOLD";
pub const ENV_TIMEOUT_MS: &str = "VIM_VISUAL_TIMEOUT_MS";
pub const ENV_SETTLE_MS: &str = "VIM_VISUAL_SETTLE_MS";
pub const ENV_VARIANT: &str = "VIM_VISUAL_VARIANT";
pub const ENV_TITLE: &str = "VIM_VISUAL_TITLE";

/// Log filter used when `RUST_LOG` is unset
pub const ENV_LOG: &str = "VIM_VISUAL_LOG";

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized harness configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// How the editor is launched and captured
    pub editor: EditorSettings,
    /// Where inputs are read and artifacts written
    pub paths: PathSettings,
    /// Pass/fail policy
    pub policy: PolicySettings,
}

/// Editor process settings
#[derive(Debug, Clone)]
pub struct EditorSettings {
    /// Editor binary
    pub binary: PathBuf,
    /// Capture script path, passed to the capture shell
    pub capture_script: PathBuf,
    /// Interpreter command line, split on whitespace
    pub capture_shell: Vec<String>,
    /// Plugin directory injected into `runtimepath`
    pub plugin_path: PathBuf,
    /// Window title
    pub title: String,
    /// Delay between launch and capture
    pub settle: Duration,
}

/// Filesystem settings
#[derive(Debug, Clone)]
pub struct PathSettings {
    /// Root under which `<run-id>/` directories are created
    pub output_dir: PathBuf,
    /// Root of `<variant>/<reference>` images
    pub ref_dir: PathBuf,
}

/// Pass/fail settings
#[derive(Debug, Clone)]
pub struct PolicySettings {
    /// Maximum mismatch percentage that still passes
    pub threshold: f64,
    /// Per-scenario time limit
    pub timeout: Duration,
    /// Pinned variant; `None` means probe the host
    pub variant: Option<Variant>,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            editor: EditorSettings::from_env(),
            paths: PathSettings::from_env(),
            policy: PolicySettings::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            editor: EditorSettings::defaults(),
            paths: PathSettings::defaults(),
            policy: PolicySettings::defaults(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl EditorSettings {
    pub fn from_env() -> Self {
        let defaults = Self::defaults();
        Self {
            binary: env::var(ENV_EDITOR).map(PathBuf::from).unwrap_or(defaults.binary),
            capture_script: env::var(ENV_CAPTURE_SCRIPT)
                .map(PathBuf::from)
                .unwrap_or(defaults.capture_script),
            capture_shell: env::var(ENV_CAPTURE_SHELL)
                .map(|s| split_command(&s))
                .unwrap_or(defaults.capture_shell),
            plugin_path: env::var(ENV_PLUGIN_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.plugin_path),
            title: env::var(ENV_TITLE).unwrap_or(defaults.title),
            settle: parse_millis(ENV_SETTLE_MS).unwrap_or(defaults.settle),
        }
    }

    pub fn defaults() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_EDITOR),
            capture_script: PathBuf::from(DEFAULT_CAPTURE_SCRIPT),
            capture_shell: split_command(DEFAULT_CAPTURE_SHELL),
            plugin_path: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            title: DEFAULT_TITLE.to_string(),
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
        }
    }
}

impl PathSettings {
    pub fn from_env() -> Self {
        Self {
            output_dir: env::var(ENV_OUTPUT_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            ref_dir: env::var(ENV_REF_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_REF_DIR)),
        }
    }

    pub fn defaults() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            ref_dir: PathBuf::from(DEFAULT_REF_DIR),
        }
    }
}

impl PolicySettings {
    pub fn from_env() -> Self {
        Self {
            threshold: env::var(ENV_THRESHOLD)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_THRESHOLD),
            timeout: parse_millis(ENV_TIMEOUT_MS)
                .unwrap_or(Duration::from_millis(DEFAULT_TIMEOUT_MS)),
            variant: env::var(ENV_VARIANT).ok().and_then(|s| s.parse().ok()),
        }
    }

    pub fn defaults() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            variant: None,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_millis(var: &str) -> Option<Duration> {
    env::var(var)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .map(Duration::from_millis)
}

/// Split an interpreter command line on whitespace
fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("powershell -ep Bypass"), vec!["powershell", "-ep", "Bypass"]);
        assert_eq!(split_command("  sh  "), vec!["sh"]);
        assert!(split_command("").is_empty());
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.editor.binary, PathBuf::from(DEFAULT_EDITOR));
        assert_eq!(config.editor.title, DEFAULT_TITLE);
        assert_eq!(config.paths.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.paths.ref_dir, PathBuf::from(DEFAULT_REF_DIR));
        assert_eq!(config.policy.threshold, 0.01);
        assert_eq!(config.policy.timeout, Duration::from_secs(5));
        assert!(config.policy.variant.is_none());
    }
}
