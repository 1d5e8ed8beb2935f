//! Waits on element state, built on the poll engine
//!
//! Matching elements are examined in document order and the first one that
//! satisfies the condition wins, consistent with the actions.

use std::fmt;
use std::time::Duration;

use crate::common::Result;
use crate::driver::AutomationSession;

use super::poll::{poll, PollOptions, Probe};
use super::Runner;

/// What a wait expects of the elements matching its selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Present and rendered
    Visible,
    /// Text content equal to the value
    TextEquals(String),
    /// Text content containing the value
    TextContains(String),
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visible => write!(f, "visible"),
            Self::TextEquals(text) => write!(f, "text equal to {text:?}"),
            Self::TextContains(text) => write!(f, "text containing {text:?}"),
        }
    }
}

/// One wait: selector, condition and bound
#[derive(Debug, Clone)]
pub struct WaitSpec {
    pub selector: String,
    pub condition: Condition,
    /// Falls back to the runner's default when `None`
    pub timeout: Option<Duration>,
}

impl WaitSpec {
    pub fn new(selector: &str, condition: Condition) -> Self {
        Self {
            selector: selector.to_string(),
            condition,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Display for WaitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' to be {}", self.selector, self.condition)
    }
}

impl Runner {
    /// Wait until `spec` holds in the active window
    pub async fn wait_for(&mut self, spec: WaitSpec) -> Result<()> {
        self.begin("wait_for", Some(&spec.selector), Some(spec.condition.to_string()))?;
        self.target_active().await?;

        let timeout = spec.timeout.unwrap_or(self.options.default_timeout);
        let opts = PollOptions::new(self.options.poll_interval, timeout, spec.to_string());
        let selector = spec.selector.clone();
        let condition = spec.condition.clone();

        poll(self.session.as_mut(), &opts, move |session| {
            let selector = selector.clone();
            let condition = condition.clone();
            Box::pin(async move { probe(session, &selector, &condition).await })
        })
        .await?;

        tracing::debug!(selector = %spec.selector, condition = %spec.condition, "Wait satisfied");
        self.finish();
        Ok(())
    }

    /// Wait until an element matching `selector` is rendered
    pub async fn wait_for_visible(&mut self, selector: &str) -> Result<()> {
        self.wait_for(WaitSpec::new(selector, Condition::Visible))
            .await
    }

    pub async fn wait_for_visible_with_timeout(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<()> {
        self.wait_for(WaitSpec::new(selector, Condition::Visible).with_timeout(timeout))
            .await
    }

    /// Wait until an element matching `selector` has text containing `expected`
    pub async fn wait_until_text_exists(&mut self, selector: &str, expected: &str) -> Result<()> {
        self.wait_for(WaitSpec::new(
            selector,
            Condition::TextContains(expected.to_string()),
        ))
        .await
    }

    /// Same as [`Runner::wait_until_text_exists`] with an explicit bound, for
    /// transitions known to outlast the default (a background install, say)
    pub async fn wait_until_text_exists_with_timeout(
        &mut self,
        selector: &str,
        expected: &str,
        timeout: Duration,
    ) -> Result<()> {
        self.wait_for(
            WaitSpec::new(selector, Condition::TextContains(expected.to_string()))
                .with_timeout(timeout),
        )
        .await
    }

    pub async fn wait_until_text_equals(&mut self, selector: &str, expected: &str) -> Result<()> {
        self.wait_for(WaitSpec::new(
            selector,
            Condition::TextEquals(expected.to_string()),
        ))
        .await
    }
}

/// Check `condition` once against the elements currently matching `selector`
async fn probe(
    session: &mut dyn AutomationSession,
    selector: &str,
    condition: &Condition,
) -> Result<Probe<()>> {
    let elements = session.find_elements(selector).await?;
    if elements.is_empty() {
        return Ok(Probe::Pending("no matching element".to_string()));
    }

    let mut seen = Vec::with_capacity(elements.len());
    for element in &elements {
        let satisfied = match condition {
            Condition::Visible => {
                let displayed = session.is_displayed(element).await?;
                if !displayed {
                    seen.push("hidden".to_string());
                }
                displayed
            }
            Condition::TextEquals(expected) => {
                let text = session.text(element).await?;
                let hit = text == *expected;
                seen.push(format!("{text:?}"));
                hit
            }
            Condition::TextContains(expected) => {
                let text = session.text(element).await?;
                let hit = text.contains(expected.as_str());
                seen.push(format!("{text:?}"));
                hit
            }
        };
        if satisfied {
            return Ok(Probe::Ready(()));
        }
    }

    Ok(Probe::Pending(seen.join(", ")))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use tokio::time::Instant;

    use crate::driver::FakeSession;
    use crate::runner::{Runner, RunnerOptions};
    use crate::Error;

    async fn runner_with(fake: &FakeSession) -> Runner {
        Runner::new(Box::new(fake.clone()), RunnerOptions::default())
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_out_label_transition() {
        let fake = FakeSession::new("main");
        fake.with(|app| {
            app.set_element("main", ".label", "Install");
            app.after(Duration::from_secs(5), |app| {
                app.set_element("main", ".label", "Launch")
            });
        });
        let mut runner = runner_with(&fake).await;
        let start = Instant::now();

        runner
            .wait_until_text_exists_with_timeout(".label", "Launch", Duration::from_secs(30))
            .await
            .unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed <= Duration::from_secs(5) + runner.options().poll_interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_timeout_applies() {
        let fake = FakeSession::new("main");
        fake.with(|app| app.set_element("main", ".label", "Install"));
        let mut runner = runner_with(&fake).await;
        let start = Instant::now();

        let err = runner
            .wait_until_text_exists(".label", "Launch")
            .await
            .unwrap_err();

        assert_eq!(start.elapsed(), runner.options().default_timeout);
        match err {
            Error::Timeout { last_seen, .. } => assert_eq!(last_seen, "\"Install\""),
            other => panic!("Expected Timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_any_matching_element_satisfies() {
        let fake = FakeSession::new("main");
        fake.with(|app| {
            app.add_element("main", ".row .title", "Other game");
            app.add_element("main", ".row .title", "111 first");
        });
        let mut runner = runner_with(&fake).await;

        runner
            .wait_until_text_exists(".row .title", "111 first")
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_equals_is_exact() {
        let fake = FakeSession::new("main");
        fake.with(|app| app.set_element("main", ".title-bar-text", "111 first - itch"));
        let mut runner = runner_with(&fake).await;

        runner
            .wait_until_text_exists(".title-bar-text", "111 first")
            .await
            .unwrap();
        let err = runner
            .wait_until_text_equals(".title-bar-text", "111 first")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_waits_for_display() {
        let fake = FakeSession::new("main");
        fake.with(|app| {
            app.set_element("main", ".no-active-downloads", "");
            app.set_displayed("main", ".no-active-downloads", false);
            app.after(Duration::from_millis(700), |app| {
                app.set_displayed("main", ".no-active-downloads", true)
            });
        });
        let mut runner = runner_with(&fake).await;
        let start = Instant::now();

        runner
            .wait_for_visible(".no-active-downloads")
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_reads_are_retried() {
        let fake = FakeSession::new("main");
        fake.with(|app| {
            app.set_element("main", ".label", "Launch");
            app.stale_reads(".label", 2);
        });
        let mut runner = runner_with(&fake).await;

        runner
            .wait_until_text_exists(".label", "Launch")
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_failure_short_circuits() {
        let fake = FakeSession::new("main");
        fake.with(|app| {
            app.set_element("main", ".label", "Install");
            app.after(Duration::from_secs(1), |app| app.disconnect("chromedriver exited"));
        });
        let mut runner = runner_with(&fake).await;
        let start = Instant::now();

        let err = runner
            .wait_until_text_exists_with_timeout(".label", "Launch", Duration::from_secs(30))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SessionFailure(_)));
        assert!(start.elapsed() <= Duration::from_secs(1) + runner.options().poll_interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_selector_fails_without_waiting() {
        let fake = FakeSession::new("main");
        fake.with(|app| app.reject_selector("div[="));
        let mut runner = runner_with(&fake).await;
        let start = Instant::now();

        let err = runner.wait_for_visible("div[=").await.unwrap_err();
        assert!(matches!(err, Error::InvalidSelector { .. }));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
