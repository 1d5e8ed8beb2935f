//! uiflow - scripted end-to-end flows for desktop apps over WebDriver
//!
//! Drives an Electron application through a WebDriver server, running either
//! built-in flows or YAML scenarios with fail-fast diagnostics.

use clap::Parser;
use commands::Commands;
use uiflow::{cli, commands};

#[derive(Parser)]
#[command(name = "uiflow", about = "Scripted UI flows over WebDriver")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli::dispatch(cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
