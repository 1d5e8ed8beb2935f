//! Scenario runner implementation
//!
//! Executes YAML scenarios step by step through the [`Runner`] primitives,
//! under the same fail-fast policy as the built-in flows.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use colored::Colorize;

use crate::common::{Error, Result};
use crate::driver::WindowHandle;
use crate::runner::{Condition, Flow, Runner, WaitSpec};

use super::config::{FlowScenario, FlowStep};

/// Result of a scenario run
#[derive(Debug)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub steps_total: usize,
    pub screenshots: usize,
    pub error: Option<String>,
}

/// Load a scenario from a YAML file
pub fn load_scenario(path: &Path) -> Result<FlowScenario> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    FlowScenario::parse(&content)
}

/// A loaded scenario, runnable as a flow
pub struct ScenarioFlow {
    scenario: FlowScenario,
    verbose: bool,
}

impl ScenarioFlow {
    pub fn new(scenario: FlowScenario, verbose: bool) -> Self {
        Self { scenario, verbose }
    }
}

#[async_trait]
impl Flow for ScenarioFlow {
    fn name(&self) -> &str {
        &self.scenario.name
    }

    fn description(&self) -> &str {
        self.scenario.description.as_deref().unwrap_or("")
    }

    async fn run(&self, runner: &mut Runner) -> Result<()> {
        let mut windows: HashMap<String, WindowHandle> = HashMap::new();

        for (i, step) in self.scenario.steps.iter().enumerate() {
            let step_num = i + 1;

            if self.verbose {
                println!(
                    "  {} Step {}: {}",
                    "…".dimmed(),
                    step_num,
                    step.describe().dimmed()
                );
            }

            match execute_step(runner, &mut windows, step).await {
                Ok(()) => {
                    println!(
                        "  {} Step {}: {}",
                        "✓".green(),
                        step_num,
                        step.describe().dimmed()
                    );
                }
                Err(e) => {
                    println!("  {} Step {}: {}", "✗".red(), step_num, step.describe());
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}

/// Run a scenario file on `runner`
pub async fn run_scenario(
    runner: &mut Runner,
    path: &Path,
    verbose: bool,
) -> Result<ScenarioResult> {
    let scenario = load_scenario(path)?;
    let steps_total = scenario.steps.len();
    let name = scenario.name.clone();

    println!(
        "\n{} {}",
        "Running Scenario:".blue().bold(),
        name.white().bold()
    );
    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }
    println!("\n{}", "Steps:".cyan());

    let flow = ScenarioFlow::new(scenario, verbose);
    match runner.run_flow(&flow).await {
        Ok(report) => {
            println!(
                "\n{} {}\n",
                "✓".green().bold(),
                "Scenario Passed".green().bold()
            );
            Ok(ScenarioResult {
                name,
                passed: true,
                steps_total,
                screenshots: report.screenshots.len(),
                error: None,
            })
        }
        Err(e) => {
            println!("\n{} {}", "✗".red().bold(), "Scenario Failed".red().bold());
            println!("  {}\n", e);
            Ok(ScenarioResult {
                name,
                passed: false,
                steps_total,
                screenshots: runner.artifacts().map(|a| a.saved().len()).unwrap_or(0),
                error: Some(e.to_string()),
            })
        }
    }
}

fn lookup<'a>(
    windows: &'a HashMap<String, WindowHandle>,
    name: &str,
) -> Result<&'a WindowHandle> {
    windows
        .get(name)
        .ok_or_else(|| Error::Config(format!("No window remembered as '{}'", name)))
}

/// Execute a single step
async fn execute_step(
    runner: &mut Runner,
    windows: &mut HashMap<String, WindowHandle>,
    step: &FlowStep,
) -> Result<()> {
    match step {
        FlowStep::Log { message } => {
            runner.log(message);
            Ok(())
        }
        FlowStep::Click { selector } => runner.click(selector).await,
        FlowStep::SetValue { selector, value } => runner.set_value(selector, value).await,
        FlowStep::WaitForVisible {
            selector,
            timeout_ms,
        } => {
            let mut spec = WaitSpec::new(selector, Condition::Visible);
            if let Some(ms) = timeout_ms {
                spec = spec.with_timeout(Duration::from_millis(*ms));
            }
            runner.wait_for(spec).await
        }
        FlowStep::WaitForText {
            selector,
            contains,
            equals,
            timeout_ms,
        } => {
            let condition = match (contains, equals) {
                (Some(text), _) => Condition::TextContains(text.clone()),
                (None, Some(text)) => Condition::TextEquals(text.clone()),
                (None, None) => {
                    return Err(Error::Config(format!(
                        "wait_for_text on '{}' has no expectation",
                        selector
                    )))
                }
            };
            let mut spec = WaitSpec::new(selector, condition);
            if let Some(ms) = timeout_ms {
                spec = spec.with_timeout(Duration::from_millis(*ms));
            }
            runner.wait_for(spec).await
        }
        FlowStep::WindowCount { count, timeout_ms } => match timeout_ms {
            Some(ms) => {
                runner
                    .wait_for_window_quantity_with_timeout(*count, Duration::from_millis(*ms))
                    .await
            }
            None => runner.wait_for_window_quantity(*count).await,
        },
        FlowStep::RememberWindow { name } => {
            let handle = runner.get_single_window_handle().await?;
            windows.insert(name.clone(), handle);
            Ok(())
        }
        FlowStep::SwitchToOther {
            excluding,
            remember_as,
        } => {
            let excluding = lookup(windows, excluding)?.clone();
            let handle = runner.switch_to_other_window(&excluding).await?;
            if let Some(label) = remember_as {
                windows.insert(label.clone(), handle);
            }
            Ok(())
        }
        FlowStep::SwitchTo { window } => {
            let handle = lookup(windows, window)?.clone();
            runner.switch_to_window(&handle).await
        }
        FlowStep::CloseAndSwitchTo { window } => {
            let handle = lookup(windows, window)?.clone();
            runner.close_current_window_and_switch_to(&handle).await
        }
        FlowStep::CloseOthers => runner.close_all_other_windows().await,
        FlowStep::Screenshot { name } => {
            runner.take_screenshot(name).await;
            Ok(())
        }
    }
}
