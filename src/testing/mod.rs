//! YAML flow scenarios
//!
//! Lets a flow be written as data instead of Rust: each step maps onto one
//! runner primitive, and the scenario runs under the same fail-fast policy
//! as the built-in flows.

mod config;
mod runner;

pub use config::*;
pub use runner::{load_scenario, run_scenario, ScenarioFlow, ScenarioResult};
