//! s3-browser library
//!
//! Exposes the CLI, the HTTP server and exit codes so the binary stays thin
//! and the handlers can be exercised in tests.

pub mod commands;
pub mod exit_code;
pub mod logging;
pub mod server;
