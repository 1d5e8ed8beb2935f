//! uiflow - scripted end-to-end flows for desktop apps
//!
//! This library drives an application through an [`driver::AutomationSession`]
//! (a W3C WebDriver server in production, an in-memory fake in tests) and
//! provides the polling waits, window management and fail-fast reporting
//! that flow scripts are written against.

pub mod cli;
pub mod commands;
pub mod common;
pub mod driver;
pub mod flows;
pub mod runner;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use runner::{Flow, Runner, RunnerOptions};
