//! Flow scenario configuration types
//!
//! Defines the data structures for deserializing YAML flow scenarios.

use serde::Deserialize;

use crate::common::{Error, Result};

/// A complete flow scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct FlowScenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// The sequence of steps to execute
    pub steps: Vec<FlowStep>,
}

/// A single step in the flow
///
/// Window names (`remember_window`, `switch_to`, ...) are labels local to
/// the scenario, bound to the handle seen when the label was remembered.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FlowStep {
    /// Log a stage description
    Log { message: String },
    /// Click the first element matching a selector
    Click { selector: String },
    /// Replace the value of the first element matching a selector
    SetValue { selector: String, value: String },
    /// Wait for an element to be rendered
    WaitForVisible {
        selector: String,
        /// Overrides the default wait bound
        timeout_ms: Option<u64>,
    },
    /// Wait for an element's text
    WaitForText {
        selector: String,
        /// Expected substring
        contains: Option<String>,
        /// Expected exact text
        equals: Option<String>,
        timeout_ms: Option<u64>,
    },
    /// Wait for a number of open windows
    WindowCount { count: usize, timeout_ms: Option<u64> },
    /// Remember the only open window under a label
    RememberWindow { name: String },
    /// Switch to the one window other than the labelled one
    SwitchToOther {
        excluding: String,
        /// Label to remember the new window under
        remember_as: Option<String>,
    },
    /// Switch to a labelled window
    SwitchTo { window: String },
    /// Close the active window and switch to a labelled one
    CloseAndSwitchTo { window: String },
    /// Close every window except the active one
    CloseOthers,
    /// Save a named screenshot
    Screenshot { name: String },
}

impl FlowStep {
    /// One-line description for step output
    pub fn describe(&self) -> String {
        match self {
            Self::Log { message } => message.clone(),
            Self::Click { selector } => format!("click {selector}"),
            Self::SetValue { selector, value } => format!("set {selector} to {value:?}"),
            Self::WaitForVisible { selector, .. } => format!("wait for {selector} to be visible"),
            Self::WaitForText {
                selector,
                contains,
                equals,
                ..
            } => match (contains, equals) {
                (Some(text), _) => format!("wait for {selector} to contain {text:?}"),
                (None, Some(text)) => format!("wait for {selector} to equal {text:?}"),
                (None, None) => format!("wait for text in {selector}"),
            },
            Self::WindowCount { count, .. } => format!("wait for {count} window(s)"),
            Self::RememberWindow { name } => format!("remember window as {name}"),
            Self::SwitchToOther { excluding, .. } => {
                format!("switch to window other than {excluding}")
            }
            Self::SwitchTo { window } => format!("switch to {window}"),
            Self::CloseAndSwitchTo { window } => format!("close window and switch to {window}"),
            Self::CloseOthers => "close other windows".to_string(),
            Self::Screenshot { name } => format!("screenshot {name:?}"),
        }
    }
}

impl FlowScenario {
    /// Parse a scenario from YAML text and check its steps
    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Self = serde_yaml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        for (i, step) in self.steps.iter().enumerate() {
            if let FlowStep::WaitForText {
                contains, equals, ..
            } = step
            {
                if contains.is_some() == equals.is_some() {
                    return Err(Error::Config(format!(
                        "Step {}: wait_for_text needs exactly one of 'contains' or 'equals'",
                        i + 1
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        let scenario = FlowScenario::parse(
            r##"
name: downloads window
steps:
  - action: remember_window
    name: main
  - action: click
    selector: "#sidebar a[href='itch://downloads']"
  - action: window_count
    count: 2
  - action: switch_to_other
    excluding: main
  - action: wait_for_text
    selector: ".download-row-item .control--title"
    contains: "111 first"
    timeout_ms: 30000
  - action: close_others
"##,
        )
        .unwrap();

        assert_eq!(scenario.name, "downloads window");
        assert_eq!(scenario.steps.len(), 6);
        assert_eq!(
            scenario.steps[2],
            FlowStep::WindowCount {
                count: 2,
                timeout_ms: None
            }
        );
        assert_eq!(scenario.steps[5], FlowStep::CloseOthers);
        assert!(matches!(
            &scenario.steps[4],
            FlowStep::WaitForText { timeout_ms: Some(30000), .. }
        ));
    }

    #[test]
    fn test_wait_for_text_needs_one_expectation() {
        let err = FlowScenario::parse(
            r#"
name: bad
steps:
  - action: wait_for_text
    selector: ".label"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(FlowScenario::parse("name: x\nsteps:\n  - action: teleport\n").is_err());
    }
}
