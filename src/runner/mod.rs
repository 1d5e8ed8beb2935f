//! Scripted session driver
//!
//! A [`Runner`] owns one automation session for the length of a run and
//! exposes the primitives flows are written in:
//!
//! - actions (`click`, `set_value`) that act once, with no implicit wait
//! - assertions (`wait_for_visible`, `wait_until_text_exists`, ...) built on
//!   [`poll::poll`]
//! - window management, which owns the active window handle
//! - the fail-fast wrapper (`must`, `run_flow`) that ends the run on the
//!   first failed step
//!
//! Every primitive takes `&mut self`: one primitive runs at a time and the
//! session is never shared.

mod actions;
pub mod artifacts;
mod assertions;
mod fail_fast;
pub mod poll;
mod windows;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::driver::{AutomationSession, WindowHandle};

pub use artifacts::Artifacts;
pub use assertions::{Condition, WaitSpec};
pub use fail_fast::{Failure, RunReport, StepContext};
pub use poll::{Probe, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};

/// One scripted scenario
#[async_trait]
pub trait Flow: Send + Sync {
    /// Name used to select the flow and label its artifacts
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Issue the scenario's steps; return on the first error
    async fn run(&self, runner: &mut Runner) -> Result<()>;
}

/// Timing used by the runner's waits
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    pub poll_interval: Duration,
    pub default_timeout: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            default_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl From<&Config> for RunnerOptions {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.timeouts.poll_interval(),
            default_timeout: config.timeouts.default_wait(),
        }
    }
}

/// Drives one automation session
pub struct Runner {
    session: Box<dyn AutomationSession>,
    options: RunnerOptions,
    /// Window every action and assertion operates on
    active: WindowHandle,
    /// Window the session is known to target; `None` after a close
    focused: Option<WindowHandle>,
    artifacts: Option<Artifacts>,
    /// Primitive still in progress; cleared when it succeeds
    step: Option<StepContext>,
    steps_run: usize,
    /// The failure that ended the run
    failure: Option<Arc<Failure>>,
}

impl Runner {
    /// Take ownership of a session; its current window becomes the active one
    pub async fn new(
        mut session: Box<dyn AutomationSession>,
        options: RunnerOptions,
    ) -> Result<Self> {
        let active = match session.current_window().await {
            Ok(handle) => handle,
            Err(e) => {
                if let Err(quit) = session.quit().await {
                    tracing::warn!(error = %quit, "Failed to end session after attach error");
                }
                return Err(e);
            }
        };
        tracing::debug!(window = %active, "Runner attached to session");

        Ok(Self {
            session,
            options,
            focused: Some(active.clone()),
            active,
            artifacts: None,
            step: None,
            steps_run: 0,
            failure: None,
        })
    }

    /// Store screenshots in `artifacts`
    pub fn with_artifacts(mut self, artifacts: Artifacts) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Window the primitives currently operate on
    pub fn active_window(&self) -> &WindowHandle {
        &self.active
    }

    pub fn artifacts(&self) -> Option<&Artifacts> {
        self.artifacts.as_ref()
    }

    /// Number of primitives started so far
    pub fn steps_run(&self) -> usize {
        self.steps_run
    }

    /// Emit a stage description for the run log
    pub fn log(&self, stage: &str) {
        tracing::info!(step = self.steps_run, "{}", stage);
    }

    /// End the run and give the session back for teardown
    pub fn into_session(self) -> Box<dyn AutomationSession> {
        self.session
    }

    /// Record the primitive about to run
    ///
    /// Refuses to start anything once the run was aborted.
    fn begin(
        &mut self,
        operation: &'static str,
        selector: Option<&str>,
        expectation: Option<String>,
    ) -> Result<()> {
        if self.failure.is_some() {
            return Err(Error::RunAborted);
        }
        self.steps_run += 1;
        tracing::debug!(
            step = self.steps_run,
            operation,
            selector = selector.unwrap_or(""),
            expectation = expectation.as_deref().unwrap_or(""),
            "Step started"
        );
        self.step = Some(StepContext {
            operation,
            selector: selector.map(str::to_string),
            expectation,
            started: Instant::now(),
        });
        Ok(())
    }

    /// Close the step opened by `begin` after the primitive succeeded
    fn finish(&mut self) {
        self.step = None;
    }

    /// Point the session at the active window if it targets another one
    async fn target_active(&mut self) -> Result<()> {
        if self.focused.as_ref() == Some(&self.active) {
            return Ok(());
        }
        self.session.switch_to_window(&self.active).await?;
        self.focused = Some(self.active.clone());
        Ok(())
    }
}
