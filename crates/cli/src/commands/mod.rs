//! Command-line definition and dispatch
//!
//! One binary, two modes: `ui` serves the browsing API over HTTP and
//! `standalone` computes a single size and exits.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use sb_core::{Config, ConfigManager, Connection, Result};

use crate::exit_code::ExitCode;

mod standalone;
mod ui;

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Print the size of a bucket or folder and exit
    Standalone,
    /// Serve the browsing API over HTTP
    Ui,
}

/// s3-browser - browse S3-compatible object storage
///
/// Serves a small session-based HTTP API for listing buckets, folders and
/// sizes, or computes one size from the command line.
#[derive(Parser, Debug, Default)]
#[command(name = "s3-browser")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Operating mode (overridden by MODE)
    #[arg(short, long, value_enum)]
    pub mode: Option<Mode>,

    /// S3 bucket name (overridden by BUCKET_NAME)
    #[arg(short, long, alias = "bucket_name")]
    pub bucket_name: Option<String>,

    /// Access key (overridden by ACCESS_KEY)
    #[arg(short = 'k', long, alias = "access_key")]
    pub access_key: Option<String>,

    /// Secret key (overridden by SECRET_KEY)
    #[arg(short, long, alias = "secret_key")]
    pub secret_key: Option<String>,

    /// S3 endpoint URL (overridden by ENDPOINT)
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Folder prefix to size; "/" means the whole bucket (overridden by FOLDER_PATH)
    #[arg(short, long, alias = "folder_path")]
    pub folder_path: Option<String>,

    /// Print sizes in human-readable units
    #[arg(long, default_value = "false")]
    pub human: bool,

    /// Address to listen on in ui mode
    #[arg(long, env = "S3_BROWSER_HOST")]
    pub host: Option<String>,

    /// Port to listen on in ui mode
    #[arg(long, env = "S3_BROWSER_PORT")]
    pub port: Option<u16>,

    /// Signing region for the endpoint
    #[arg(long, env = "S3_BROWSER_REGION")]
    pub region: Option<String>,

    /// Configuration file (default: ~/.config/s3-browser/config.toml)
    #[arg(long, env = "S3_BROWSER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "S3_BROWSER_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub debug: bool,
}

impl Cli {
    /// Apply the legacy environment variables, which win over flags
    pub fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| env(key).filter(|value| !value.is_empty());

        if let Some(mode) = var("MODE").and_then(|m| Mode::from_str(&m, true).ok()) {
            self.mode = Some(mode);
        }

        for (key, slot) in [
            ("BUCKET_NAME", &mut self.bucket_name),
            ("ACCESS_KEY", &mut self.access_key),
            ("SECRET_KEY", &mut self.secret_key),
            ("ENDPOINT", &mut self.endpoint),
            ("FOLDER_PATH", &mut self.folder_path),
        ] {
            if let Some(value) = var(key) {
                *slot = Some(value);
            }
        }
    }

    /// Load the config file and layer flag values on top
    pub fn load_config(&self) -> Result<Config> {
        let manager = match &self.config {
            Some(path) => ConfigManager::with_path(path.clone()),
            None => ConfigManager::new()?,
        };
        let mut config = manager.load()?;

        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(region) = &self.region {
            config.s3.region = region.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }

        Ok(config)
    }

    /// Connection from flags, when endpoint and both keys are present
    pub fn connection(&self) -> Option<Result<Connection>> {
        match (&self.endpoint, &self.access_key, &self.secret_key) {
            (Some(endpoint), Some(key), Some(secret)) => {
                Some(Connection::new(endpoint.as_str(), key.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }
}

/// Execute the selected mode and return an exit code
pub async fn execute(cli: Cli, config: Config) -> ExitCode {
    match cli.mode {
        Some(Mode::Standalone) => standalone::execute(&cli, &config).await,
        Some(Mode::Ui) => ui::execute(&cli, config).await,
        None => {
            eprintln!("Error: Mode must be specified (--mode standalone|ui or MODE)");
            ExitCode::UsageError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("s3-browser").chain(args.iter().copied())).unwrap()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_parse_short_flags() {
        let cli = parse(&[
            "-m", "standalone", "-b", "data", "-k", "key", "-s", "secret", "-e",
            "http://localhost:9000", "-f", "logs/",
        ]);
        assert_eq!(cli.mode, Some(Mode::Standalone));
        assert_eq!(cli.bucket_name.as_deref(), Some("data"));
        assert_eq!(cli.access_key.as_deref(), Some("key"));
        assert_eq!(cli.secret_key.as_deref(), Some("secret"));
        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(cli.folder_path.as_deref(), Some("logs/"));
    }

    #[test]
    fn test_parse_underscore_aliases() {
        let cli = parse(&["--mode", "ui", "--bucket_name", "b", "--access_key", "k"]);
        assert_eq!(cli.mode, Some(Mode::Ui));
        assert_eq!(cli.bucket_name.as_deref(), Some("b"));
        assert_eq!(cli.access_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_env_overrides_flags() {
        let mut cli = parse(&["-m", "ui", "-b", "from-flag", "-f", "flag/"]);
        cli.apply_env_overrides(env_of(&[
            ("MODE", "standalone"),
            ("BUCKET_NAME", "from-env"),
            ("FOLDER_PATH", ""),
        ]));

        assert_eq!(cli.mode, Some(Mode::Standalone));
        assert_eq!(cli.bucket_name.as_deref(), Some("from-env"));
        // empty variables are ignored
        assert_eq!(cli.folder_path.as_deref(), Some("flag/"));
    }

    #[test]
    fn test_unknown_mode_in_env_is_ignored() {
        let mut cli = parse(&["-m", "ui"]);
        cli.apply_env_overrides(env_of(&[("MODE", "batch")]));
        assert_eq!(cli.mode, Some(Mode::Ui));
    }

    #[test]
    fn test_connection_requires_all_parts() {
        let cli = parse(&["-e", "http://localhost:9000", "-k", "key"]);
        assert!(cli.connection().is_none());

        let cli = parse(&["-e", "http://localhost:9000", "-k", "key", "-s", "secret"]);
        let conn = cli.connection().unwrap().unwrap();
        assert_eq!(conn.endpoint, "http://localhost:9000");
    }

    #[test]
    fn test_load_config_applies_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "schema_version = 1\n[server]\nport = 7000\nhost = \"127.0.0.1\"\n")
            .unwrap();

        let mut cli = parse(&["--port", "9999", "--region", "eu-central-1"]);
        cli.config = Some(path);
        let config = cli.load_config().unwrap();

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.s3.region, "eu-central-1");
    }
}
