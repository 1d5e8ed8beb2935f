//! Error types for uiflow
//!
//! Every primitive returns these; the fail-fast wrapper turns the first one
//! into an [`Error::Aborted`] carrying the diagnostics of the failing step.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::driver::WindowHandle;
use crate::runner::Failure;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for uiflow
#[derive(Error, Debug)]
pub enum Error {
    // === Primitive Errors ===
    #[error("No element matches selector '{selector}'")]
    NotFound { selector: String },

    #[error("Timed out after {}ms waiting for {what} (last seen: {last_seen})", .waited.as_millis())]
    Timeout {
        what: String,
        waited: Duration,
        last_seen: String,
    },

    #[error("Expected {expected}, found {found} open window(s)")]
    AmbiguousWindow { expected: String, found: usize },

    #[error("Window {0} is not open")]
    StaleHandle(WindowHandle),

    #[error("Invalid window operation: {0}")]
    WindowConflict(String),

    // === Session Errors ===
    #[error("Automation session failed: {0}")]
    SessionFailure(String),

    #[error("Element went stale: {0}")]
    StaleElement(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("WebDriver error '{code}': {message}")]
    Driver { code: String, message: String },

    // === Run Errors ===
    #[error("{0}")]
    Aborted(Arc<Failure>),

    #[error("Run was aborted by an earlier failed step")]
    RunAborted,

    #[error("Unknown flow '{name}'. Available: {available}")]
    UnknownFlow { name: String, available: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a not found error for a selector
    pub fn not_found(selector: &str) -> Self {
        Self::NotFound {
            selector: selector.to_string(),
        }
    }

    /// Create a timeout error
    pub fn timeout(what: &str, waited: Duration, last_seen: &str) -> Self {
        Self::Timeout {
            what: what.to_string(),
            waited,
            last_seen: last_seen.to_string(),
        }
    }

    /// Create an ambiguous window error
    pub fn ambiguous_window(expected: &str, found: usize) -> Self {
        Self::AmbiguousWindow {
            expected: expected.to_string(),
            found,
        }
    }

    /// Whether a poll may retry after seeing this error.
    ///
    /// Only conditions that can resolve themselves as the UI keeps rendering
    /// qualify; everything else ends the poll on the spot.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleElement(_))
    }

    /// Whether this error already went through the fail-fast wrapper
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}
