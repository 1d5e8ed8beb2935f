//! Fail-fast run driver
//!
//! Every step in a flow is load-bearing: the first error ends the run. The
//! wrapper records which primitive was running, captures a screenshot at the
//! point of failure and wraps the cause in [`Error::Aborted`]. After that the
//! runner refuses to start any further primitive, and the first failure stays
//! the one reported.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::common::{Error, Result};

use super::{Flow, Runner};

/// The primitive currently executing
#[derive(Debug, Clone)]
pub struct StepContext {
    pub operation: &'static str,
    pub selector: Option<String>,
    pub expectation: Option<String>,
    pub started: Instant,
}

/// Diagnostics for the step that ended a run
#[derive(Debug)]
pub struct Failure {
    /// 1-based index of the failed primitive within the run
    pub step: usize,
    pub operation: String,
    pub selector: Option<String>,
    pub expectation: Option<String>,
    pub elapsed: Duration,
    pub screenshot: Option<PathBuf>,
    pub cause: Error,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Step {} ({}) failed after {}ms: {}",
            self.step,
            self.operation,
            self.elapsed.as_millis(),
            self.cause
        )?;
        if let Some(selector) = &self.selector {
            write!(f, "\n  selector: {selector}")?;
        }
        if let Some(expectation) = &self.expectation {
            write!(f, "\n  expected: {expectation}")?;
        }
        if let Some(path) = &self.screenshot {
            write!(f, "\n  screenshot: {}", path.display())?;
        }
        Ok(())
    }
}

/// Summary of a flow that ran to completion
#[derive(Debug)]
pub struct RunReport {
    pub flow: String,
    pub steps: usize,
    pub elapsed: Duration,
    pub screenshots: Vec<PathBuf>,
}

impl Runner {
    /// Pass `result` through, or end the run on its error
    ///
    /// Errors that already ended the run are returned unchanged. A refusal to
    /// start after the abort is replaced by the failure that caused it.
    pub async fn must<T: Send>(&mut self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) if e.is_aborted() => Err(e),
            Err(Error::RunAborted) => match &self.failure {
                Some(failure) => Err(Error::Aborted(Arc::clone(failure))),
                None => Err(Error::RunAborted),
            },
            Err(cause) => Err(self.abort(cause).await),
        }
    }

    /// The failure that ended the run, if it was aborted
    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_deref()
    }

    /// Run `flow` under the fail-fast policy
    pub async fn run_flow(&mut self, flow: &dyn Flow) -> Result<RunReport> {
        let started = Instant::now();
        let first_step = self.steps_run;
        tracing::info!(flow = flow.name(), "Flow started");

        let outcome = flow.run(self).await;
        self.must(outcome).await?;

        let report = RunReport {
            flow: flow.name().to_string(),
            steps: self.steps_run - first_step,
            elapsed: started.elapsed(),
            screenshots: self
                .artifacts
                .as_ref()
                .map(|a| a.saved().to_vec())
                .unwrap_or_default(),
        };
        tracing::info!(
            flow = %report.flow,
            steps = report.steps,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Flow passed"
        );
        Ok(report)
    }

    /// Save a named screenshot of the active window
    ///
    /// Diagnostic only: a failed capture is logged and does not fail the run.
    pub async fn take_screenshot(&mut self, name: &str) -> Option<PathBuf> {
        let artifacts = self.artifacts.as_ref()?;
        let dir = artifacts.dir().to_path_buf();

        if let Err(e) = self.target_active().await {
            tracing::warn!(name, error = %e, "Cannot target active window for screenshot");
        }
        let png = match self.session.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                tracing::warn!(name, error = %e, "Screenshot capture failed");
                return None;
            }
        };

        let artifacts = self.artifacts.as_mut()?;
        match artifacts.save_screenshot(name, &png) {
            Ok(path) => {
                tracing::info!(name, path = %path.display(), "Screenshot saved");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(name, dir = %dir.display(), error = %e, "Screenshot not saved");
                None
            }
        }
    }

    async fn abort(&mut self, cause: Error) -> Error {
        let step = self.step.take();
        let (operation, selector, expectation, elapsed) = match step {
            Some(ctx) => (
                ctx.operation.to_string(),
                ctx.selector,
                ctx.expectation,
                ctx.started.elapsed(),
            ),
            None => ("flow".to_string(), None, None, Duration::ZERO),
        };

        tracing::error!(
            step = self.steps_run,
            operation = %operation,
            selector = selector.as_deref().unwrap_or(""),
            expectation = expectation.as_deref().unwrap_or(""),
            elapsed_ms = elapsed.as_millis() as u64,
            error = %cause,
            "Step failed, aborting run"
        );

        let screenshot = self
            .take_screenshot(&format!("failure {operation}"))
            .await;
        let failure = Arc::new(Failure {
            step: self.steps_run,
            operation,
            selector,
            expectation,
            elapsed,
            screenshot,
            cause,
        });
        self.failure = Some(Arc::clone(&failure));
        Error::Aborted(failure)
    }
}
