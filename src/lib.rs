//! Vim Visual Harness - visual regression testing for Vim plugins.
//!
//! This crate provides:
//! - Launch argument construction for a clean, deterministic gvim session
//! - Process-based editor control with external screenshot capture
//! - A mock editor for exercising the pipeline without a display
//! - Tolerance-based pixel comparison with diff image output
//! - Scenario tables and a sequential suite runner with per-run output dirs
//!
//! # Example
//!
//! ```rust,no_run
//! use vim_visual_harness::{
//!     Config, Editor, GvimEditor, RunContext, SuiteSettings, builtin_scenarios, probe, run_suite,
//! };
//!
//! let config = Config::from_env();
//! let variant = probe::resolve(config.policy.variant).unwrap();
//! let settings = SuiteSettings::from_config(&config, variant);
//! let ctx = RunContext::new(&config.paths.output_dir);
//! let mut make_editor = || -> Box<dyn Editor> { Box::new(GvimEditor::new(config.editor.clone())) };
//! let report = run_suite(&ctx, &builtin_scenarios(), &settings, &mut make_editor)
//! .unwrap();
//! assert!(report.success());
//! ```

pub mod compare;
pub mod config;
pub mod editor;
pub mod harness;
pub mod launch;
pub mod probe;
pub mod report;
pub mod run;

pub use config::Config;

// Re-export harness types
pub use harness::{
    HarnessError, HarnessResult, Scenario, SuiteSettings, bless_references, builtin_scenarios,
    load_scenarios, reference_path, run_scenario, run_suite,
};

// Re-export editors
pub use editor::{Deadline, Editor, GvimEditor, MockEditor, MockWindow, launch_and_capture};

pub use compare::{CompareOptions, Comparison, ErrorMode, compare_images, compare_png_bytes};
pub use launch::LaunchConfig;
pub use probe::Variant;
pub use report::{RunReport, ScenarioReport, Status};
pub use run::RunContext;
