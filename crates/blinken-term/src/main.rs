#![forbid(unsafe_code)]

//! `blinkenbbs` binary entry point.

use blinken_term::{app, cli, logging};

fn main() {
    let opts = cli::Opts::parse();

    if let Some(path) = &opts.log_file
        && let Err(e) = logging::init(path, opts.log_filter.as_deref())
    {
        eprintln!("Failed to open log file {}: {e}", path.display());
        std::process::exit(1);
    }

    match app::run(&opts) {
        Ok(summary) => {
            tracing::info!(
                resumes = summary.resumes,
                elapsed = ?summary.elapsed,
                reason = ?summary.reason,
                "exiting"
            );
        }
        Err(e) => {
            tracing::error!(%e, "runtime error");
            eprintln!("Runtime error: {e}");
            std::process::exit(1);
        }
    }
}
