//! `osc` - run scenarios from the command line

use anyhow::Context;
use clap::{Parser, Subcommand};
use osc_core::{InterpreterConfig, ScenarioFile, ScenarioRunner};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "osc", version)]
#[command(about = "Interpret scenario files against a built-in kinematic simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scenario until it reaches a verdict
    Run {
        /// Scenario YAML file
        scenario: PathBuf,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seconds per tick
        #[arg(long)]
        step: Option<f64>,

        /// Fail after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Fail once simulation time exceeds this many seconds
        #[arg(long)]
        time_limit: Option<f64>,

        /// Write a JUnit XML report here
        #[arg(long)]
        junit: Option<PathBuf>,

        /// Write a JSON report here
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Load a scenario and resolve every name without running it
    Check {
        /// Scenario YAML file
        scenario: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match execute(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Run {
            scenario,
            config,
            step,
            max_ticks,
            time_limit,
            junit,
            json,
        } => {
            let mut config = match config {
                Some(path) => InterpreterConfig::from_path(&path)
                    .with_context(|| format!("loading configuration {}", path.display()))?,
                None => InterpreterConfig::default(),
            };
            if let Some(step) = step {
                config = config.with_step_time(step);
            }
            if let Some(max_ticks) = max_ticks {
                config = config.with_max_ticks(max_ticks);
            }
            if let Some(time_limit) = time_limit {
                config = config.with_time_limit(time_limit);
            }
            init_logging(&config.log_filter);

            let file = load(&scenario)?;
            let output_directory = config.output_directory.clone();
            let mut runner = ScenarioRunner::from_file(&file, config)
                .with_context(|| format!("loading scenario {}", scenario.display()))?;
            let report = runner.run();

            print!("{}", report.generate_text());
            if let Some(path) = json {
                std::fs::write(&path, report.to_json()?)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            if let Some(path) = junit {
                std::fs::write(&path, report.to_junit_xml())
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            if let Some(directory) = output_directory {
                for path in report.write_to(&directory)? {
                    info!(path = %path.display(), "report written");
                }
            }

            Ok(if report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Check { scenario } => {
            init_logging("info");
            let file = load(&scenario)?;
            let loaded = file
                .load()
                .with_context(|| format!("checking scenario {}", scenario.display()))?;
            println!(
                "{}: ok ({} elements)",
                scenario.display(),
                loaded.storyboard.elements().count()
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load(path: &Path) -> anyhow::Result<ScenarioFile> {
    ScenarioFile::from_path(path).with_context(|| format!("reading scenario {}", path.display()))
}

/// `RUST_LOG` wins over the configured filter
fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
