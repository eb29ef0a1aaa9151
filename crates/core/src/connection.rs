//! Connection parameters
//!
//! A connection names one S3-compatible endpoint plus the credentials used
//! against it. It lives only inside a server-side session and is never
//! written to disk.

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

/// Endpoint and credentials for one object store
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    /// S3 endpoint URL
    pub endpoint: String,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,
}

impl Connection {
    /// Build a connection, checking that the endpoint is an http(s) URL
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        let parsed = Url::parse(&endpoint)?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(Error::Resolution(format!(
                "endpoint must be an http or https URL: {endpoint}"
            )));
        }

        Ok(Self {
            endpoint,
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        })
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
