//! CLI command handling
//!
//! Resolves settings, opens the WebDriver session and prints run outcomes.

use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::commands::{Commands, SessionArgs};
use crate::common::config::Config;
use crate::common::paths::{config_path, default_artifacts_root, slugify};
use crate::common::{logging, Result};
use crate::driver::{AutomationSession, WebDriverSession};
use crate::flows;
use crate::runner::{Artifacts, Runner, RunnerOptions};
use crate::testing;

/// Dispatch a CLI command
///
/// Returns `Ok(false)` when a flow or scenario ran and failed; its
/// diagnostics have already been printed.
pub async fn dispatch(command: Commands) -> Result<bool> {
    match command {
        Commands::Run { flow, session } => {
            let flow = flows::find(&flow)?;
            let config = resolve_config(&session)?;
            let run_dir = run_dir(&config, flow.name());
            init_run_logging(run_dir.as_deref(), session.verbose);

            let mut runner = open_runner(&config, run_dir.as_deref()).await?;

            println!("{} {}", "Running flow:".blue().bold(), flow.name().white().bold());
            if !flow.description().is_empty() {
                println!("  {}", flow.description().dimmed());
            }

            let outcome = runner.run_flow(flow.as_ref()).await;
            close(runner).await;

            match outcome {
                Ok(report) => {
                    println!(
                        "\n{} {} ({} steps in {:.1}s)",
                        "✓".green().bold(),
                        "Flow Passed".green().bold(),
                        report.steps,
                        report.elapsed.as_secs_f64()
                    );
                    for shot in &report.screenshots {
                        println!("  screenshot: {}", shot.display());
                    }
                    Ok(true)
                }
                Err(e) => {
                    println!("\n{} {}", "✗".red().bold(), "Flow Failed".red().bold());
                    println!("{}", e);
                    Ok(false)
                }
            }
        }

        Commands::Scenario { path, session } => {
            let config = resolve_config(&session)?;
            let label = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "scenario".to_string());
            let run_dir = run_dir(&config, &label);
            init_run_logging(run_dir.as_deref(), session.verbose);

            let mut runner = open_runner(&config, run_dir.as_deref()).await?;
            let outcome = testing::run_scenario(&mut runner, &path, session.verbose).await;
            close(runner).await;

            let result = outcome?;
            if let Some(dir) = &run_dir {
                println!("  artifacts: {}", dir.display());
            }
            Ok(result.passed)
        }

        Commands::Flows => {
            logging::init_cli(false);
            println!("Built-in flows:");
            for flow in flows::builtin() {
                println!("  {:<12} {}", flow.name().bold(), flow.description().dimmed());
            }
            Ok(true)
        }

        Commands::Config => {
            logging::init_cli(false);
            let config = Config::load()?;

            match config_path() {
                Some(path) if path.exists() => println!("Config file: {}", path.display()),
                Some(path) => println!(
                    "Config file: {} (not found, using defaults)",
                    path.display()
                ),
                None => println!("Config file: (no config directory on this platform)"),
            }
            println!();
            println!("[webdriver]");
            println!("  url      = {}", config.webdriver.url);
            match &config.webdriver.app {
                Some(app) => println!("  app      = {}", app.display()),
                None => println!("  app      = (driver default)"),
            }
            println!("  app_args = {:?}", config.webdriver.app_args);
            println!("[timeouts]");
            println!("  poll_interval_ms = {}", config.timeouts.poll_interval_ms);
            println!("  default_wait_ms  = {}", config.timeouts.default_wait_ms);
            println!("[artifacts]");
            match artifacts_root(&config) {
                Some(dir) => println!("  dir = {}", dir.display()),
                None => println!("  dir = (none)"),
            }
            Ok(true)
        }
    }
}

/// Load the config file and apply command-line overrides
fn resolve_config(args: &SessionArgs) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(url) = &args.webdriver_url {
        config.webdriver.url = url.clone();
    }
    if let Some(app) = &args.app {
        config.webdriver.app = Some(app.clone());
    }
    if let Some(dir) = &args.artifacts {
        config.artifacts.dir = Some(dir.clone());
    }
    Ok(config)
}

fn artifacts_root(config: &Config) -> Option<PathBuf> {
    config.artifacts.dir.clone().or_else(default_artifacts_root)
}

/// Fresh directory for one run: `<root>/<label>-<unix seconds>`
fn run_dir(config: &Config, label: &str) -> Option<PathBuf> {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    artifacts_root(config).map(|root| root.join(format!("{}-{}", slugify(label), stamp)))
}

fn init_run_logging(run_dir: Option<&Path>, verbose: bool) {
    if let Some(log_file) = logging::init_run(run_dir, verbose) {
        tracing::debug!(path = %log_file.display(), "Writing run log");
    }
}

async fn open_runner(config: &Config, run_dir: Option<&Path>) -> Result<Runner> {
    let session = WebDriverSession::connect(
        &config.webdriver.url,
        config.webdriver.app.as_deref(),
        &config.webdriver.app_args,
    )
    .await?;

    let runner = Runner::new(Box::new(session), RunnerOptions::from(config)).await?;

    match run_dir.map(Artifacts::create) {
        Some(Ok(artifacts)) => Ok(runner.with_artifacts(artifacts)),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Screenshots disabled");
            Ok(runner)
        }
        None => Ok(runner),
    }
}

/// Quit the session; a failure here never changes the run's outcome
async fn close(runner: Runner) {
    let mut session: Box<dyn AutomationSession> = runner.into_session();
    if let Err(e) = session.quit().await {
        tracing::warn!(error = %e, "Failed to end WebDriver session");
    }
}
