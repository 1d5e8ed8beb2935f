//! CLI command definitions
//!
//! Defines the clap commands for the uiflow CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Session and output settings shared by the commands that drive the app
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// WebDriver server URL (overrides `webdriver.url`)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Application binary to launch (overrides `webdriver.app`)
    #[arg(long)]
    pub app: Option<PathBuf>,

    /// Directory for screenshots and the run log (overrides `artifacts.dir`)
    #[arg(long)]
    pub artifacts: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a built-in flow
    Run {
        /// Flow name (see `uiflow flows`)
        flow: String,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Execute a flow scenario defined in a YAML file
    Scenario {
        /// Path to the YAML scenario file
        path: PathBuf,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// List built-in flows
    Flows,

    /// Show the config file path and effective settings
    Config,
}
