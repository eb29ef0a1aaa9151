//! ObjectStore trait definition
//!
//! This trait defines the primitive calls the browser needs from an
//! S3-compatible store. Paging and aggregation live in [`crate::listing`]
//! so every backend gets them for free and tests can mock the primitives.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::connection::Connection;
use crate::error::Result;

/// Whether a listing entry is a real object or a grouped common prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Object,
    Folder,
}

/// One row of a delimited listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Object key, or the common prefix (delimiter included) for folders
    pub key: String,

    /// Size in bytes (None for folders)
    pub size: Option<i64>,

    /// Last modified timestamp (None for folders)
    pub last_modified: Option<Timestamp>,

    pub kind: EntryKind,
}

impl ObjectEntry {
    /// Create an entry for a stored object
    pub fn object(key: impl Into<String>, size: i64, last_modified: Option<Timestamp>) -> Self {
        Self {
            key: key.into(),
            size: Some(size),
            last_modified,
            kind: EntryKind::Object,
        }
    }

    /// Create an entry for a common prefix
    pub fn folder(prefix: impl Into<String>) -> Self {
        Self {
            key: prefix.into(),
            size: None,
            last_modified: None,
            kind: EntryKind::Folder,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// Options for a single list request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Prefix to filter by
    pub prefix: Option<String>,

    /// Delimiter for grouping (usually "/"); None lists the flat key space
    pub delimiter: Option<String>,

    /// Maximum number of keys to return per request
    pub max_keys: Option<i32>,

    /// Continuation token for pagination
    pub continuation_token: Option<String>,
}

/// One page of a list request
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Common prefixes grouped under the delimiter
    pub prefixes: Vec<String>,

    /// Objects returned directly on this page
    pub objects: Vec<ObjectEntry>,

    /// Whether more pages follow
    pub truncated: bool,

    /// Token for the next page
    pub continuation_token: Option<String>,
}

/// Trait for S3-compatible storage operations
///
/// This trait is implemented by the S3 adapter and can be mocked for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every bucket visible to the credentials, in provider order
    async fn list_buckets(&self) -> Result<Vec<String>>;

    /// Fetch a single page of objects
    async fn list_page(&self, bucket: &str, options: ListOptions) -> Result<ListPage>;
}

/// Builds a store handle from connection parameters
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, connection: &Connection) -> Result<Arc<dyn ObjectStore>>;
}
