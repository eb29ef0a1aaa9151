//! ui mode - serve the browsing API over HTTP

use std::sync::Arc;

use anyhow::Context;
use sb_core::{Config, SessionStore};
use sb_s3::S3Connector;

use super::Cli;
use crate::exit_code::ExitCode;
use crate::server::{self, AppState};

/// Execute ui mode
pub async fn execute(cli: &Cli, config: Config) -> ExitCode {
    match run(cli, config).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            tracing::error!("Server failed: {e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::GeneralError
        }
    }
}

async fn run(cli: &Cli, config: Config) -> anyhow::Result<()> {
    let connector = Arc::new(S3Connector::new(config.s3.clone()));
    let mut sessions = SessionStore::new(connector, config.server.session_ttl())
        .with_max_sessions(config.server.max_sessions);

    if let Some(connection) = cli.connection() {
        let connection = connection.context("invalid default connection")?;
        tracing::info!(endpoint = %connection.endpoint, "Using default connection for new sessions");
        sessions = sessions.with_default_connection(connection);
    }

    server::serve(&config.server, AppState::new(sessions)).await
}
