//! Logging and tracing configuration
//!
//! Runs log to stderr; when the run has an artifact directory the same events
//! are also written, with full detail, to `run.log` inside it.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Name of the log file written next to the screenshots
pub const RUN_LOG_FILE: &str = "run.log";

/// `RUST_LOG` when set, otherwise this crate at info (debug with `verbose`)
/// and dependencies at warn
fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("uiflow=debug,warn")
        } else {
            EnvFilter::new("uiflow=info,warn")
        }
    })
}

fn stderr_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
}

/// Open (or append to) the run log inside `dir`
fn open_run_log(dir: &Path) -> Option<(File, PathBuf)> {
    let path = dir.join(RUN_LOG_FILE);
    let opened = std::fs::create_dir_all(dir)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&path));

    match opened {
        Ok(file) => Some((file, path)),
        Err(e) => {
            eprintln!("Warning: Could not open log file {}: {}", path.display(), e);
            None
        }
    }
}

/// Initialize tracing for plain CLI commands (stderr logging)
pub fn init_cli(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(stderr_layer())
        .init();
}

/// Initialize tracing for a flow run (stderr + optional file logging)
///
/// Returns the path of the log file when one could be opened.
pub fn init_run(artifacts_dir: Option<&Path>, verbose: bool) -> Option<PathBuf> {
    let (file_layer, log_path) = match artifacts_dir.and_then(open_run_log) {
        Some((file, path)) => {
            let layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE);
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(file_layer)
        .with(stderr_layer())
        .init();

    log_path
}
