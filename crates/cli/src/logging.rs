//! Logging setup
//!
//! Warnings and errors only by default; `--debug` turns on debug output for
//! this workspace's crates. `RUST_LOG` takes precedence over both.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "warn";
const DEBUG_FILTER: &str = "warn,s3_browser=debug,sb_core=debug,sb_s3=debug";

/// Install the global subscriber, writing to `log_file` when given
pub fn init(debug: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let default = if debug { DEBUG_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()?;
        }
        None => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
    }

    tracing::info!("==== Starting new run ====");
    Ok(())
}
