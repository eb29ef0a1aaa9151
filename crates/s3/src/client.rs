//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from sb-core.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_smithy_types::DateTime;

use sb_core::{
    Connection, Connector, ListOptions, ListPage, ObjectEntry, ObjectStore, Result, S3Settings,
};

use crate::error::classify;

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client for a connection
    pub async fn new(connection: &Connection, settings: &S3Settings) -> Result<Self> {
        // Build credentials provider
        let credentials = aws_credential_types::Credentials::new(
            connection.access_key.clone(),
            connection.secret_key.clone(),
            None, // session token
            None, // expiry
            "s3-browser-session",
        );

        // Build SDK config
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(settings.region.clone()))
            .endpoint_url(&connection.endpoint)
            .retry_config(RetryConfig::disabled())
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(settings.force_path_style)
            .build();

        tracing::debug!(
            endpoint = %connection.endpoint,
            region = %settings.region,
            "Created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }
}

fn to_timestamp(dt: &DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::new(dt.secs(), dt.subsec_nanos() as i32).ok()
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut continuation_token: Option<String> = None;

        // Paginate through all results
        loop {
            let response = self
                .inner
                .list_buckets()
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(classify)?;

            names.extend(
                response
                    .buckets()
                    .iter()
                    .filter_map(|b| b.name().map(str::to_string)),
            );

            match response.continuation_token() {
                Some(token) if !token.is_empty() => continuation_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(names)
    }

    async fn list_page(&self, bucket: &str, options: ListOptions) -> Result<ListPage> {
        let mut request = self.inner.list_objects_v2().bucket(bucket);

        if let Some(p) = options.prefix {
            request = request.prefix(p);
        }

        // Set delimiter (for one-level listing)
        if let Some(d) = options.delimiter {
            request = request.delimiter(d);
        }

        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }

        if let Some(token) = options.continuation_token {
            request = request.continuation_token(token);
        }

        let response = request.send().await.map_err(classify)?;

        let prefixes = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();

        let objects = response
            .contents()
            .iter()
            .map(|object| {
                ObjectEntry::object(
                    object.key().unwrap_or_default(),
                    object.size().unwrap_or(0),
                    object.last_modified().and_then(to_timestamp),
                )
            })
            .collect();

        Ok(ListPage {
            prefixes,
            objects,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(str::to_string),
        })
    }
}

/// Builds [`S3Client`]s for new sessions
#[derive(Debug, Clone, Default)]
pub struct S3Connector {
    settings: S3Settings,
}

impl S3Connector {
    pub fn new(settings: S3Settings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Connector for S3Connector {
    async fn connect(&self, connection: &Connection) -> Result<Arc<dyn ObjectStore>> {
        let client = S3Client::new(connection, &self.settings).await?;
        Ok(Arc::new(client))
    }
}
