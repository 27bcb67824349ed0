use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vim_visual_harness::compare::{CompareOptions, DEFAULT_THRESHOLD, compare_png_bytes};
use vim_visual_harness::config::{self, ENV_LOG};
use vim_visual_harness::{
    Editor, GvimEditor, MockEditor, RunContext, Scenario, SuiteSettings, Variant,
    bless_references, builtin_scenarios, load_scenarios, probe, run_suite,
};

/// Vim Visual Harness - screenshot regression tests for Vim plugins
#[derive(Parser, Debug)]
#[command(
    name = "vim-visual-harness",
    about = "Visual regression testing for Vim plugins with screenshot capture and pixel comparison",
    after_help = "ENVIRONMENT VARIABLES:\n\
        VIM_VISUAL_EDITOR          Editor binary (default: gvim)\n\
        VIM_VISUAL_CAPTURE_SCRIPT  Screenshot capture script\n\
        VIM_VISUAL_CAPTURE_SHELL   Interpreter for the capture script\n\
        VIM_VISUAL_PLUGIN_PATH     Plugin directory added to runtimepath\n\
        VIM_VISUAL_OUTPUT_DIR      Root of per-run output directories\n\
        VIM_VISUAL_REF_DIR         Root of reference images\n\
        VIM_VISUAL_THRESHOLD       Maximum passing mismatch percentage\n\
        VIM_VISUAL_TIMEOUT_MS      Per-scenario time limit\n\
        VIM_VISUAL_VARIANT         Pin the reference variant (server/desktop)\n\
        VIM_VISUAL_LOG             Log filter when RUST_LOG is unset"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the scenario suite and compare against reference images
    Run {
        /// Only run scenarios whose label contains this text (e.g., "@4")
        #[arg(short, long)]
        filter: Option<String>,

        /// JSON scenario file (default: built-in :WToggleClean suite)
        #[arg(short, long)]
        scenarios: Option<PathBuf>,

        /// Reference variant, skipping host detection
        #[arg(long)]
        variant: Option<Variant>,

        /// Drive the mock editor instead of gvim
        #[arg(long)]
        mock: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Capture scenarios into their reference paths, replacing stored images
    Bless {
        #[arg(short, long)]
        filter: Option<String>,

        #[arg(short, long)]
        scenarios: Option<PathBuf>,

        #[arg(long)]
        variant: Option<Variant>,

        #[arg(long)]
        mock: bool,
    },

    /// List scenarios with their launch arguments
    List {
        #[arg(short, long)]
        scenarios: Option<PathBuf>,
    },

    /// Compare two PNG files
    Compare {
        actual: PathBuf,

        reference: PathBuf,

        /// Write the diff image here
        #[arg(short, long)]
        diff: Option<PathBuf>,

        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
    },

    /// Print the detected reference variant
    Detect,

    /// Print the editor argument list for the given startup commands
    Args {
        #[arg(allow_hyphen_values = true)]
        commands: Vec<String>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = config::get();

    match args.command {
        Some(Commands::Run {
            filter,
            scenarios,
            variant,
            mock,
            json,
        }) => {
            let scenarios = scenarios_from(scenarios.as_ref())?;
            let variant = probe::resolve(variant.or(config.policy.variant))
                .context("cannot select reference images")?;
            let settings = SuiteSettings::from_config(config, variant).filter(filter);
            let ctx = RunContext::new(&config.paths.output_dir);
            let mut make_editor = editor_factory(mock);

            let report = run_suite(&ctx, &scenarios, &settings, &mut make_editor)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for case in &report.scenarios {
                    match &case.error {
                        None => println!("  ok      {}", case.label),
                        Some(error) => println!("  FAILED  {}: {}", case.label, error),
                    }
                }
                println!(
                    "\n{} passing, {} failing (variant: {}, output: {})",
                    report.passed(),
                    report.failed(),
                    report.variant,
                    report.output_dir.display()
                );
            }

            if !report.success() {
                std::process::exit(1);
            }
        }

        Some(Commands::Bless {
            filter,
            scenarios,
            variant,
            mock,
        }) => {
            let scenarios = scenarios_from(scenarios.as_ref())?;
            let variant = probe::resolve(variant.or(config.policy.variant))
                .context("cannot select reference images")?;
            let settings = SuiteSettings::from_config(config, variant).filter(filter);
            let mut make_editor = editor_factory(mock);

            for path in bless_references(&scenarios, &settings, &mut make_editor)? {
                println!("Updated reference: {}", path.display());
            }
        }

        Some(Commands::List { scenarios }) => {
            let scenarios = scenarios_from(scenarios.as_ref())?;
            for (index, scenario) in scenarios.iter().enumerate() {
                println!("{}", scenario.label(index));
                println!("    ref:  {}", scenario.reference);
                println!("    args: {}", scenario.args.join(" "));
            }
        }

        Some(Commands::Compare {
            actual,
            reference,
            diff,
            threshold,
        }) => {
            let actual_bytes =
                std::fs::read(&actual).with_context(|| format!("reading {}", actual.display()))?;
            let reference_bytes = std::fs::read(&reference)
                .with_context(|| format!("reading {}", reference.display()))?;
            let comparison =
                compare_png_bytes(&actual_bytes, &reference_bytes, &CompareOptions::default())?;

            if let Some(path) = diff {
                comparison.write_diff(&path)?;
                println!("Diff image: {}", path.display());
            }
            if !comparison.same_dimensions() {
                println!("Dimension difference: {:?}", comparison.dimension_difference);
            }
            println!("Mismatch: {}%", comparison.mismatch_percentage);

            if !comparison.passes(threshold) {
                bail!(
                    "Visual difference of {}% detected.",
                    comparison.mismatch_percentage
                );
            }
        }

        Some(Commands::Detect) => {
            let variant = probe::detect()?;
            println!("{}", variant);
        }

        Some(Commands::Args { commands }) => {
            let settings = SuiteSettings::from_config(config, Variant::Desktop);
            for arg in settings.launch.arguments(&commands) {
                println!("{}", arg);
            }
        }

        None => {
            println!("Vim Visual Harness - screenshot regression tests for Vim plugins");
            println!();
            println!("Usage: vim-visual-harness <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run      Run the scenario suite");
            println!("  bless    Replace reference images with fresh captures");
            println!("  list     List scenarios");
            println!("  compare  Compare two PNG files");
            println!("  detect   Print the detected reference variant");
            println!("  args     Print the editor argument list");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::EnvFilter::from_default_env(),
        Err(_) => tracing_subscriber::EnvFilter::new(
            std::env::var(ENV_LOG).unwrap_or_else(|_| "info".to_string()),
        ),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn scenarios_from(path: Option<&PathBuf>) -> Result<Vec<Scenario>> {
    match path {
        Some(path) => load_scenarios(path)
            .with_context(|| format!("loading scenarios from {}", path.display())),
        None => Ok(builtin_scenarios()),
    }
}

fn editor_factory(mock: bool) -> impl FnMut() -> Box<dyn Editor> {
    let settings = config::get().editor.clone();
    move || -> Box<dyn Editor> {
        if mock {
            Box::new(MockEditor::new())
        } else {
            Box::new(GvimEditor::new(settings.clone()))
        }
    }
}
