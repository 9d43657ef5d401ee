#![forbid(unsafe_code)]

//! Tracing subscriber setup.
//!
//! The terminal owns stdout and the alternate screen, so log output only
//! ever goes to a file. Without `--log-file` no subscriber is installed and
//! every tracing macro is a cheap disabled callsite.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Filter used when `BLINKENBBS_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Build the filter from a directive, falling back to [`DEFAULT_FILTER`]
/// when the directive does not parse.
pub fn filter(directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

fn open(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install a global `fmt` subscriber appending to `path`.
///
/// Returns `Ok(false)` if another global subscriber was already set.
///
/// # Errors
///
/// Returns an error if the file cannot be opened.
pub fn init(path: &Path, directive: Option<&str>) -> io::Result<bool> {
    let file = open(path)?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter(directive))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::info!(path = %path.display(), "logging started");
    }
    Ok(installed)
}
