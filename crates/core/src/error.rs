//! Error types for sb-core
//!
//! One closed taxonomy for every failure the browser can report. Store faults
//! are classified into these variants at the SDK boundary; the HTTP layer only
//! ever shows the caller an [`ErrorToken`], never a raw provider message.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for sb-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sb-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The endpoint actively refused the TCP connection
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    /// The endpoint could not be reached (timeout, reset, TLS failure, ...)
    #[error("Endpoint connection error: {0}")]
    Connection(String),

    /// The endpoint host name could not be resolved
    #[error("Endpoint resolution error: {0}")]
    Resolution(String),

    /// Invalid access key, secret key or request signature
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Malformed bucket name
    #[error("Bucket error: {0}")]
    Bucket(String),

    /// Bucket or key does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other fault reported by the store
    #[error("Store error: {0}")]
    Store(String),

    /// No connection has been established for this caller
    #[error("No active session")]
    NoSession,

    /// A listing or size operation was requested before selecting a bucket
    #[error("No bucket selected")]
    NoBucketSelected,

    /// Endpoint URL parsing error
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Catch-all for faults outside the taxonomy
    #[error("{0}")]
    Unknown(String),
}

/// User-visible error names sent back to HTTP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorToken {
    ConnectionRefusedError,
    BucketError,
    AccessError,
    ClientError,
    EndpointConnectionError,
    EndpointResolutionError,
    NoSessionError,
    NoBucketSelectedError,
    UnknownError,
}

impl ErrorToken {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConnectionRefusedError => "ConnectionRefusedError",
            Self::BucketError => "BucketError",
            Self::AccessError => "AccessError",
            Self::ClientError => "ClientError",
            Self::EndpointConnectionError => "EndpointConnectionError",
            Self::EndpointResolutionError => "EndpointResolutionError",
            Self::NoSessionError => "NoSessionError",
            Self::NoBucketSelectedError => "NoBucketSelectedError",
            Self::UnknownError => "UnknownError",
        }
    }
}

impl std::fmt::Display for ErrorToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// The token shown to HTTP clients for this error
    pub const fn token(&self) -> ErrorToken {
        match self {
            Error::ConnectionRefused(_) => ErrorToken::ConnectionRefusedError,
            Error::Connection(_) => ErrorToken::EndpointConnectionError,
            Error::Resolution(_) | Error::InvalidUrl(_) => ErrorToken::EndpointResolutionError,
            Error::Auth(_) => ErrorToken::AccessError,
            Error::Bucket(_) | Error::NotFound(_) => ErrorToken::BucketError,
            Error::Store(_) => ErrorToken::ClientError,
            Error::NoSession => ErrorToken::NoSessionError,
            Error::NoBucketSelected => ErrorToken::NoBucketSelectedError,
            _ => ErrorToken::UnknownError,
        }
    }

    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidUrl(_) | Error::NoBucketSelected => 2, // UsageError
            Error::ConnectionRefused(_) | Error::Connection(_) | Error::Resolution(_) => 3, // NetworkError
            Error::Auth(_) => 4,                                    // AuthError
            Error::NotFound(_) | Error::Bucket(_) => 5,             // NotFound
            _ => 1,                                                 // GeneralError
        }
    }
}
