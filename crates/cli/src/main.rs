//! s3-browser - browse S3-compatible object storage
//!
//! Serves a session-based HTTP API for listing buckets, folders and sizes
//! (`--mode ui`), or prints the size of one bucket or folder (`--mode standalone`).

use clap::Parser;

use s3_browser::commands::{self, Cli};
use s3_browser::exit_code::ExitCode;
use s3_browser::logging;

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();
    cli.apply_env_overrides(|key| std::env::var(key).ok());

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(ExitCode::UsageError.as_i32());
        }
    };

    if let Err(e) = logging::init(cli.debug, config.logging.file.as_deref()) {
        eprintln!("Error: {e:#}");
        std::process::exit(ExitCode::GeneralError.as_i32());
    }

    let exit_code = commands::execute(cli, config).await;
    std::process::exit(exit_code.as_i32());
}
