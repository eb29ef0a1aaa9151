//! Browsing session
//!
//! Per-caller state carried across otherwise stateless HTTP calls: the
//! active connection, the selected bucket, and the last bucket and object
//! listings. Sessions are created only once a connection has been proven to
//! work, so every `BrowsingSession` holds a live store handle.

use std::sync::Arc;

use serde::Serialize;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::listing::ObjectStoreExt as _;
use crate::traits::{Connector, ObjectEntry, ObjectStore};

/// Delimiter used for folder grouping in object listings
pub const DELIMITER: &str = "/";

/// Session state as shown to the caller, without credentials
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub endpoint: String,
    pub bucket: Option<String>,
    pub buckets: Vec<String>,
    pub prefix: Option<String>,
}

pub struct BrowsingSession {
    connection: Connection,
    store: Arc<dyn ObjectStore>,
    selected_bucket: Option<String>,
    buckets: Option<Vec<String>>,
    objects: Option<Vec<ObjectEntry>>,
    listed_prefix: Option<String>,
}

impl BrowsingSession {
    /// Connect and validate by listing buckets
    ///
    /// Nothing is created when the store rejects the connection; the error
    /// is returned as classified by the store.
    pub async fn open(connector: &dyn Connector, connection: Connection) -> Result<Self> {
        let store = connector.connect(&connection).await?;
        let buckets = store.list_buckets().await?;

        tracing::info!(
            endpoint = %connection.endpoint,
            buckets = buckets.len(),
            "Connection validated"
        );

        Ok(Self {
            connection,
            store,
            selected_bucket: None,
            buckets: Some(buckets),
            objects: None,
            listed_prefix: None,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn selected_bucket(&self) -> Option<&str> {
        self.selected_bucket.as_deref()
    }

    /// Last bucket listing, if any
    pub fn cached_buckets(&self) -> Option<&[String]> {
        self.buckets.as_deref()
    }

    /// Last object listing, if any
    pub fn cached_objects(&self) -> Option<&[ObjectEntry]> {
        self.objects.as_deref()
    }

    /// Remember the bucket to browse; existence is checked by later calls
    pub fn select_bucket(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.selected_bucket.as_deref() == Some(name.as_str()) {
            return;
        }

        tracing::debug!(bucket = %name, "Bucket selected");
        self.selected_bucket = Some(name);
        self.objects = None;
        self.listed_prefix = None;
    }

    /// Cached bucket list, fetched on first use
    pub async fn get_buckets(&mut self) -> Result<Vec<String>> {
        if let Some(buckets) = &self.buckets {
            return Ok(buckets.clone());
        }
        self.refresh_buckets().await
    }

    /// Fetch the bucket list from the store and replace the cache
    pub async fn refresh_buckets(&mut self) -> Result<Vec<String>> {
        let buckets = self.store.list_buckets().await?;
        self.buckets = Some(buckets.clone());
        Ok(buckets)
    }

    /// List one level under `prefix` in the selected bucket
    pub async fn get_objects(&mut self, prefix: &str) -> Result<Vec<ObjectEntry>> {
        let bucket = self.require_bucket()?.to_string();
        let objects = self.store.list_objects(&bucket, prefix, DELIMITER).await?;

        self.objects = Some(objects.clone());
        self.listed_prefix = Some(prefix.to_string());
        Ok(objects)
    }

    /// Total size under `prefix` in the selected bucket (whole bucket when empty)
    pub async fn get_size(&self, prefix: &str) -> Result<i64> {
        let bucket = self.require_bucket()?;
        if prefix.is_empty() {
            self.store.calculate_total_size(bucket).await
        } else {
            self.store.calculate_prefix_size(bucket, prefix).await
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            endpoint: self.connection.endpoint.clone(),
            bucket: self.selected_bucket.clone(),
            buckets: self.buckets.clone().unwrap_or_default(),
            prefix: self.listed_prefix.clone(),
        }
    }

    fn require_bucket(&self) -> Result<&str> {
        match self.selected_bucket.as_deref() {
            Some(bucket) if !bucket.is_empty() => Ok(bucket),
            _ => Err(Error::NoBucketSelected),
        }
    }
}

impl std::fmt::Debug for BrowsingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowsingSession")
            .field("connection", &self.connection)
            .field("selected_bucket", &self.selected_bucket)
            .field("buckets", &self.buckets)
            .field("objects", &self.objects.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ListPage, MockConnector, MockObjectStore};

    fn connection() -> Connection {
        Connection::new("http://localhost:9000", "key", "secret").unwrap()
    }

    fn connector_for(store: MockObjectStore) -> MockConnector {
        let store: Arc<dyn ObjectStore> = Arc::new(store);
        let mut connector = MockConnector::new();
        connector
            .expect_connect()
            .returning(move |_| Ok(store.clone()));
        connector
    }

    fn store_with_buckets(names: &'static [&'static str]) -> MockObjectStore {
        let mut store = MockObjectStore::new();
        store
            .expect_list_buckets()
            .times(1)
            .returning(move || Ok(names.iter().map(|n| n.to_string()).collect()));
        store
    }

    #[tokio::test]
    async fn test_open_caches_buckets_in_provider_order() {
        let connector = connector_for(store_with_buckets(&["C", "A", "B"]));
        let mut session = BrowsingSession::open(&connector, connection())
            .await
            .unwrap();

        // list_buckets expects exactly one call: both reads come from the cache
        assert_eq!(session.get_buckets().await.unwrap(), vec!["C", "A", "B"]);
        assert_eq!(session.get_buckets().await.unwrap(), vec!["C", "A", "B"]);
    }

    #[tokio::test]
    async fn test_open_surfaces_store_error() {
        let mut store = MockObjectStore::new();
        store
            .expect_list_buckets()
            .returning(|| Err(Error::Auth("InvalidAccessKeyId".into())));
        let connector = connector_for(store);

        let err = BrowsingSession::open(&connector, connection())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_refresh_buckets_refetches() {
        let mut store = MockObjectStore::new();
        let mut calls = 0;
        store.expect_list_buckets().times(2).returning(move || {
            calls += 1;
            Ok(vec![format!("bucket-{calls}")])
        });
        let connector = connector_for(store);
        let mut session = BrowsingSession::open(&connector, connection())
            .await
            .unwrap();

        assert_eq!(session.refresh_buckets().await.unwrap(), vec!["bucket-2"]);
        assert_eq!(session.get_buckets().await.unwrap(), vec!["bucket-2"]);
    }

    #[tokio::test]
    async fn test_size_and_objects_require_bucket() {
        let connector = connector_for(store_with_buckets(&["A"]));
        let mut session = BrowsingSession::open(&connector, connection())
            .await
            .unwrap();

        assert!(matches!(
            session.get_size("").await,
            Err(Error::NoBucketSelected)
        ));
        assert!(matches!(
            session.get_objects("").await,
            Err(Error::NoBucketSelected)
        ));

        session.select_bucket("");
        assert!(matches!(
            session.get_size("x/").await,
            Err(Error::NoBucketSelected)
        ));
    }

    #[tokio::test]
    async fn test_select_bucket_is_idempotent() {
        let mut store = store_with_buckets(&["A", "B"]);
        store
            .expect_list_page()
            .times(1)
            .returning(|_, _| {
                Ok(ListPage {
                    objects: vec![ObjectEntry::object("k", 1, None)],
                    ..Default::default()
                })
            });
        let connector = connector_for(store);
        let mut session = BrowsingSession::open(&connector, connection())
            .await
            .unwrap();

        session.select_bucket("B");
        session.get_objects("").await.unwrap();
        session.select_bucket("B");

        assert_eq!(session.selected_bucket(), Some("B"));
        assert_eq!(session.cached_objects().map(<[_]>::len), Some(1));

        session.select_bucket("A");
        assert!(session.cached_objects().is_none());
    }

    #[tokio::test]
    async fn test_get_objects_replaces_cache() {
        let mut store = store_with_buckets(&["B"]);
        store
            .expect_list_page()
            .withf(|bucket, opts| bucket == "B" && opts.delimiter.as_deref() == Some("/"))
            .returning(|_, opts| {
                let prefix = opts.prefix.unwrap_or_default();
                Ok(ListPage {
                    prefixes: vec![format!("{prefix}sub/")],
                    objects: vec![ObjectEntry::object(format!("{prefix}file"), 7, None)],
                    ..Default::default()
                })
            });
        let connector = connector_for(store);
        let mut session = BrowsingSession::open(&connector, connection())
            .await
            .unwrap();
        session.select_bucket("B");

        let top = session.get_objects("").await.unwrap();
        assert_eq!(top[0].key, "sub/");
        assert_eq!(top[1].key, "file");

        session.get_objects("sub/").await.unwrap();
        let cached = session.cached_objects().unwrap();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].key, "sub/sub/");
        assert_eq!(session.snapshot().prefix.as_deref(), Some("sub/"));
    }

    #[tokio::test]
    async fn test_get_size_empty_prefix_is_whole_bucket() {
        let mut store = store_with_buckets(&["B"]);
        store
            .expect_list_page()
            .withf(|_, opts| opts.prefix.is_none())
            .returning(|_, _| {
                Ok(ListPage {
                    objects: vec![
                        ObjectEntry::object("a/1", 10, None),
                        ObjectEntry::object("b/2", 32, None),
                    ],
                    ..Default::default()
                })
            });
        store
            .expect_list_page()
            .withf(|_, opts| opts.prefix.as_deref() == Some("a/"))
            .returning(|_, _| {
                Ok(ListPage {
                    objects: vec![ObjectEntry::object("a/1", 10, None)],
                    ..Default::default()
                })
            });
        let connector = connector_for(store);
        let mut session = BrowsingSession::open(&connector, connection())
            .await
            .unwrap();
        session.select_bucket("B");

        assert_eq!(session.get_size("").await.unwrap(), 42);
        assert_eq!(session.get_size("a/").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_snapshot_omits_credentials() {
        let connector = connector_for(store_with_buckets(&["A"]));
        let mut session = BrowsingSession::open(&connector, connection())
            .await
            .unwrap();
        session.select_bucket("A");

        let json = serde_json::to_string(&session.snapshot()).unwrap();
        assert!(json.contains("http://localhost:9000"));
        assert!(json.contains("\"bucket\":\"A\""));
        assert!(!json.contains("secret"));
        assert!(!json.contains("key"));
    }
}
