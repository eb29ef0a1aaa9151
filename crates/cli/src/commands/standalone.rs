//! standalone mode - print the size of a bucket or folder
//!
//! Computes one size against the store and prints it as a single integer
//! (or a human-readable size with `--human`) on stdout.

use sb_core::{Config, Connection, Error, ObjectStoreExt as _};
use sb_s3::S3Client;

use super::Cli;
use crate::exit_code::ExitCode;

/// Everything a size computation needs
#[derive(Debug)]
struct SizeRequest {
    connection: Connection,
    bucket: String,
    prefix: String,
}

impl SizeRequest {
    fn from_cli(cli: &Cli) -> Result<Self, String> {
        let missing = || {
            "In standalone mode, bucket_name, access_key, secret_key and endpoint must be specified"
                .to_string()
        };

        let bucket = cli.bucket_name.clone().ok_or_else(missing)?;
        let connection = cli
            .connection()
            .ok_or_else(missing)?
            .map_err(|e| e.to_string())?;

        Ok(Self {
            connection,
            bucket,
            prefix: scope_prefix(cli.folder_path.as_deref()).to_string(),
        })
    }
}

/// "/" or nothing selects the whole bucket; anything else is a key prefix
fn scope_prefix(folder_path: Option<&str>) -> &str {
    match folder_path {
        None | Some("/") => "",
        Some(prefix) => prefix,
    }
}

fn format_size(size: i64, human: bool) -> String {
    if human {
        humansize::format_size(size.max(0) as u64, humansize::BINARY)
    } else {
        size.to_string()
    }
}

/// Execute standalone mode
pub async fn execute(cli: &Cli, config: &Config) -> ExitCode {
    let request = match SizeRequest::from_cli(cli) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::UsageError;
        }
    };

    tokio::select! {
        result = calculate(&request, config) => match result {
            Ok(size) => {
                println!("{}", format_size(size, cli.human));
                ExitCode::Success
            }
            Err(e) => {
                tracing::error!(bucket = %request.bucket, error = %e, "Size calculation failed");
                eprintln!("Error: {e}");
                ExitCode::from(&e)
            }
        },
        _ = tokio::signal::ctrl_c() => ExitCode::Interrupted,
    }
}

async fn calculate(request: &SizeRequest, config: &Config) -> Result<i64, Error> {
    let client = S3Client::new(&request.connection, &config.s3).await?;
    if request.prefix.is_empty() {
        client.calculate_total_size(&request.bucket).await
    } else {
        client
            .calculate_prefix_size(&request.bucket, &request.prefix)
            .await
    }
}
