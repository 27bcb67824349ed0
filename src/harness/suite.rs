use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::scenario::reference_path;
use super::types::{HarnessError, HarnessResult, Scenario};
use crate::compare::{CompareOptions, Comparison, compare_png_bytes};
use crate::config::Config;
use crate::editor::{Deadline, Editor, launch_and_capture};
use crate::launch::LaunchConfig;
use crate::probe::Variant;
use crate::report::{RunReport, ScenarioReport, Status};
use crate::run::RunContext;

/// Everything a scenario needs besides the run context and the editor
#[derive(Debug, Clone)]
pub struct SuiteSettings {
    pub launch: LaunchConfig,
    /// Root of `<variant>/<reference>` images
    pub ref_dir: PathBuf,
    pub variant: Variant,
    /// Maximum passing mismatch percentage
    pub threshold: f64,
    /// Per-scenario time limit
    pub timeout: Duration,
    pub compare: CompareOptions,
    /// Only run scenarios whose label contains this text
    pub filter: Option<String>,
}

impl SuiteSettings {
    /// Build settings from the harness configuration and a resolved variant
    pub fn from_config(config: &Config, variant: Variant) -> Self {
        Self {
            launch: LaunchConfig::new(&config.editor.plugin_path).title(&config.editor.title),
            ref_dir: config.paths.ref_dir.clone(),
            variant,
            threshold: config.policy.threshold,
            timeout: config.policy.timeout,
            compare: CompareOptions::default(),
            filter: None,
        }
    }

    pub fn filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    fn selects(&self, label: &str) -> bool {
        self.filter.as_deref().map_or(true, |f| label.contains(f))
    }
}

/// Run one scenario through launch, capture, comparison and threshold check.
///
/// Writes `<index>-result.png`, `<index>-ref.png` and `<index>-diff.png`
/// into the run directory; the diff is written whether or not the check
/// passes.
pub fn run_scenario(
    ctx: &RunContext,
    index: usize,
    scenario: &Scenario,
    editor: &mut dyn Editor,
    settings: &SuiteSettings,
) -> HarnessResult<Comparison> {
    let args = settings.launch.arguments(&scenario.args);
    let reference = reference_path(&settings.ref_dir, settings.variant, &scenario.reference);
    let deadline = Deadline::after(settings.timeout);
    tracing::debug!(index, reference = %reference.display(), ?args, "scenario configured");

    let result_path = ctx.result_path(index);
    launch_and_capture(editor, &args, &result_path, deadline)?;

    let screenshot = fs::read(&result_path)?;
    let reference_bytes = fs::read(&reference)?;
    fs::write(ctx.reference_copy_path(index), &reference_bytes)?;

    let comparison = compare_png_bytes(&screenshot, &reference_bytes, &settings.compare)?;
    comparison.write_diff(&ctx.diff_path(index))?;
    tracing::debug!(
        index,
        mismatch = comparison.mismatch_percentage,
        same_dimensions = comparison.same_dimensions(),
        "compared"
    );

    if deadline.expired() {
        return Err(deadline.timeout("comparing images"));
    }
    if !comparison.passes(settings.threshold) {
        return Err(HarnessError::Mismatch {
            percentage: comparison.mismatch_percentage,
        });
    }
    Ok(comparison)
}

/// Run scenarios sequentially with a fresh editor each, recording every
/// outcome. Only suite-fatal errors abort the run.
pub fn run_suite(
    ctx: &RunContext,
    scenarios: &[Scenario],
    settings: &SuiteSettings,
    make_editor: &mut dyn FnMut() -> Box<dyn Editor>,
) -> HarnessResult<RunReport> {
    ctx.init()?;
    let started = Utc::now();
    let mut reports = Vec::new();

    for (index, scenario) in scenarios.iter().enumerate() {
        let label = scenario.label(index);
        if !settings.selects(&label) {
            continue;
        }

        let clock = Instant::now();
        let mut editor = make_editor();
        let outcome = run_scenario(ctx, index, scenario, editor.as_mut(), settings);
        drop(editor);

        let reference = reference_path(&settings.ref_dir, settings.variant, &scenario.reference);
        let report = build_report(ctx, index, label, reference, outcome, clock.elapsed());
        match &report.error {
            None => tracing::info!(case = %report.label, "ok"),
            Some(error) => tracing::warn!(case = %report.label, %error, "FAILED"),
        }
        reports.push(report);
    }

    Ok(RunReport {
        run_id: ctx.id.clone(),
        output_dir: ctx.dir.clone(),
        variant: settings.variant.to_string(),
        started,
        scenarios: reports,
    })
}

/// Capture each scenario straight into its reference path, replacing the
/// stored image. Returns the written paths.
pub fn bless_references(
    scenarios: &[Scenario],
    settings: &SuiteSettings,
    make_editor: &mut dyn FnMut() -> Box<dyn Editor>,
) -> HarnessResult<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (index, scenario) in scenarios.iter().enumerate() {
        if !settings.selects(&scenario.label(index)) {
            continue;
        }
        let reference = reference_path(&settings.ref_dir, settings.variant, &scenario.reference);
        if let Some(parent) = reference.parent() {
            fs::create_dir_all(parent)?;
        }

        let args = settings.launch.arguments(&scenario.args);
        let mut editor = make_editor();
        launch_and_capture(editor.as_mut(), &args, &reference, Deadline::after(settings.timeout))?;
        tracing::info!(index, path = %reference.display(), "reference updated");
        written.push(reference);
    }
    Ok(written)
}

fn build_report(
    ctx: &RunContext,
    index: usize,
    label: String,
    reference: PathBuf,
    outcome: HarnessResult<Comparison>,
    elapsed: Duration,
) -> ScenarioReport {
    let existing = |path: PathBuf| path.exists().then_some(path);
    let (status, mismatch_percentage, error) = match outcome {
        Ok(comparison) => (Status::Passed, Some(comparison.mismatch_percentage), None),
        Err(HarnessError::Mismatch { percentage }) => (
            Status::Failed,
            Some(percentage),
            Some(HarnessError::Mismatch { percentage }.to_string()),
        ),
        Err(e) => (Status::Failed, None, Some(e.to_string())),
    };

    ScenarioReport {
        index,
        label,
        reference,
        result_path: existing(ctx.result_path(index)),
        diff_path: existing(ctx.diff_path(index)),
        mismatch_percentage,
        status,
        error,
        elapsed_ms: elapsed.as_millis() as u64,
    }
}
