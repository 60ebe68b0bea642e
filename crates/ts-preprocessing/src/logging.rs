//! Logging setup for the command-line binary.
//!
//! The library only emits `tracing` events; this module installs the
//! subscriber that prints them. `RUST_LOG` overrides the requested level.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// Keeps the subscriber installed until dropped.
pub struct LoggingGuard {
    _default: Option<DefaultGuard>,
}

/// Install the subscriber for the current thread.
///
/// When `json_output` is true, logging is disabled so stdout only carries
/// JSON. With `log_file` set, plain-text events are appended to that file
/// instead of stderr.
pub fn init(
    level: &str,
    quiet: bool,
    json_output: bool,
    log_file: Option<&Path>,
) -> Result<LoggingGuard> {
    if json_output {
        return Ok(LoggingGuard { _default: None });
    }

    let effective_level = if quiet { "warn" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    let guard = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("cannot create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;

            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .finish();
            tracing::subscriber::set_default(subscriber)
        }
        None => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_default(subscriber)
        }
    };

    Ok(LoggingGuard {
        _default: Some(guard),
    })
}
