//! Logging support for SwapX
//!
//! Diagnostics go to stderr, filtered by `RUST_LOG` or the `-v` count. When
//! debug logging is enabled in the config, events are also appended to
//! ~/.swapx/swapx.log.

use anyhow::Result;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

const LOG_FILE_NAME: &str = "swapx.log";

/// Filter directive for a given verbosity when RUST_LOG is not set
pub fn default_directive(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "swapx=error";
    }
    match verbosity {
        0 => "swapx=warn",
        1 => "swapx=info",
        _ => "swapx=debug",
    }
}

/// Initialize the logging system
///
/// Returns the path of the debug log file when one was opened.
pub fn init_logging(verbosity: u8, quiet: bool, debug_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity, quiet)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time();

    // If the log file can't be opened, keep going with stderr only
    let file_layer = debug_dir.and_then(|dir| match open_log_file(dir) {
        Ok(appender) => Some(
            fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_target(false)
                .with_filter(EnvFilter::new("swapx=debug")),
        ),
        Err(e) => {
            eprintln!("Warning: Could not create log file in {}: {:#}", dir.display(), e);
            None
        }
    });
    let log_path = file_layer
        .as_ref()
        .and(debug_dir.map(|dir| dir.join(LOG_FILE_NAME)));

    let subscriber = registry()
        .with(stderr_layer.with_filter(filter))
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    Ok(log_path)
}

fn open_log_file(dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(dir)?;
    Ok(appender)
}
