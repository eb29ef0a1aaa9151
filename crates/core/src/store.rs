//! Session registry
//!
//! Maps opaque session ids to browsing sessions. Each session sits behind its
//! own mutex so requests from one caller are serialized while different
//! callers never touch each other's state. Idle sessions are swept on access.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::session::BrowsingSession;
use crate::traits::Connector;

/// Live sessions kept before the least recently used one is evicted
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// Shared handle to one caller's session
pub type SessionHandle = Arc<Mutex<BrowsingSession>>;

/// Opaque session identifier (a UUID v4)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Mint a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept only well-formed ids coming back from clients
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(|id| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A session resolved for one request
pub struct ResolvedSession {
    pub id: SessionId,
    pub session: SessionHandle,
    /// True when the session was opened for this request from the default connection
    pub created: bool,
}

struct Entry {
    session: SessionHandle,
    last_seen: Instant,
}

/// Keyed store of browsing sessions
pub struct SessionStore {
    connector: Arc<dyn Connector>,
    sessions: Mutex<HashMap<SessionId, Entry>>,
    ttl: Duration,
    max_sessions: usize,
    default_connection: Option<Connection>,
}

impl SessionStore {
    pub fn new(connector: Arc<dyn Connector>, ttl: Duration) -> Self {
        Self {
            connector,
            sessions: Mutex::new(HashMap::new()),
            ttl,
            max_sessions: DEFAULT_MAX_SESSIONS,
            default_connection: None,
        }
    }

    /// Cap the number of live sessions (at least one)
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// Open sessions from `connection` for callers that arrive without one
    pub fn with_default_connection(mut self, connection: Connection) -> Self {
        self.default_connection = Some(connection);
        self
    }

    /// Validate `connection` and install a new session for the caller
    ///
    /// The caller's id is kept only when it names a live session, which is
    /// then replaced; any other id is discarded for a fresh one. When the
    /// store is full the least recently used session is evicted.
    /// On failure no session is created or replaced.
    pub async fn open(
        &self,
        id: Option<SessionId>,
        connection: Connection,
    ) -> Result<(SessionId, Vec<String>)> {
        let session = BrowsingSession::open(self.connector.as_ref(), connection).await?;
        let buckets = session
            .cached_buckets()
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        let mut sessions = self.sessions.lock().await;
        self.sweep(&mut sessions);

        let id = match id {
            Some(id) if sessions.contains_key(&id) => id,
            _ => SessionId::generate(),
        };
        if !sessions.contains_key(&id) && sessions.len() >= self.max_sessions {
            evict_oldest(&mut sessions);
        }
        sessions.insert(
            id.clone(),
            Entry {
                session: Arc::new(Mutex::new(session)),
                last_seen: Instant::now(),
            },
        );
        tracing::info!(session = %id, active = sessions.len(), "Session opened");

        Ok((id, buckets))
    }

    /// Look up a live session, refreshing its idle timer
    pub async fn get(&self, id: &SessionId) -> Result<SessionHandle> {
        let mut sessions = self.sessions.lock().await;
        self.sweep(&mut sessions);

        let entry = sessions.get_mut(id).ok_or(Error::NoSession)?;
        entry.last_seen = Instant::now();
        Ok(entry.session.clone())
    }

    /// Look up the caller's session, falling back to the default connection
    pub async fn resolve(&self, id: Option<&SessionId>) -> Result<ResolvedSession> {
        if let Some(id) = id {
            match self.get(id).await {
                Ok(session) => {
                    return Ok(ResolvedSession {
                        id: id.clone(),
                        session,
                        created: false,
                    });
                }
                Err(Error::NoSession) => {}
                Err(e) => return Err(e),
            }
        }

        let Some(connection) = self.default_connection.clone() else {
            return Err(Error::NoSession);
        };
        let (id, _) = self.open(None, connection).await?;
        let session = self.get(&id).await?;
        Ok(ResolvedSession {
            id,
            session,
            created: true,
        })
    }

    /// Drop a session; returns whether it existed
    pub async fn clear(&self, id: &SessionId) -> bool {
        let removed = self.sessions.lock().await.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "Session cleared");
        }
        removed
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        self.sweep(&mut sessions);
        sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn sweep(&self, sessions: &mut HashMap<SessionId, Entry>) {
        let ttl = self.ttl;
        sessions.retain(|id, entry| {
            let alive = entry.last_seen.elapsed() < ttl;
            if !alive {
                tracing::debug!(session = %id, "Session expired");
            }
            alive
        });
    }
}

fn evict_oldest(sessions: &mut HashMap<SessionId, Entry>) {
    let oldest = sessions
        .iter()
        .min_by_key(|(_, entry)| entry.last_seen)
        .map(|(id, _)| id.clone());
    if let Some(id) = oldest {
        sessions.remove(&id);
        tracing::info!(session = %id, "Session evicted, store full");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockConnector, MockObjectStore, ObjectStore};

    const HOUR: Duration = Duration::from_secs(3600);

    fn connection(key: &str) -> Connection {
        Connection::new("http://localhost:9000", key, "secret").unwrap()
    }

    /// Connector that accepts only the access key "good"
    fn connector() -> Arc<dyn Connector> {
        let mut connector = MockConnector::new();
        connector.expect_connect().returning(|conn| {
            if conn.access_key != "good" {
                return Err(Error::Auth("InvalidAccessKeyId".into()));
            }
            let mut store = MockObjectStore::new();
            store
                .expect_list_buckets()
                .returning(|| Ok(vec!["A".to_string(), "B".to_string()]));
            let store: Arc<dyn ObjectStore> = Arc::new(store);
            Ok(store)
        });
        Arc::new(connector)
    }

    #[tokio::test]
    async fn test_open_then_get() {
        let store = SessionStore::new(connector(), HOUR);
        let (id, buckets) = store.open(None, connection("good")).await.unwrap();
        assert_eq!(buckets, vec!["A", "B"]);

        let session = store.get(&id).await.unwrap();
        assert_eq!(
            session.lock().await.connection().endpoint,
            "http://localhost:9000"
        );
    }

    #[tokio::test]
    async fn test_unknown_id_is_no_session() {
        let store = SessionStore::new(connector(), HOUR);
        let err = store.get(&SessionId::generate()).await.unwrap_err();
        assert!(matches!(err, Error::NoSession));
    }

    #[tokio::test]
    async fn test_failed_open_leaves_existing_session() {
        let store = SessionStore::new(connector(), HOUR);
        let (id, _) = store.open(None, connection("good")).await.unwrap();
        store.get(&id).await.unwrap().lock().await.select_bucket("A");

        let err = store
            .open(Some(id.clone()), connection("bad"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));

        let session = store.get(&id).await.unwrap();
        assert_eq!(session.lock().await.selected_bucket(), Some("A"));
    }

    #[tokio::test]
    async fn test_reopen_replaces_state() {
        let store = SessionStore::new(connector(), HOUR);
        let (id, _) = store.open(None, connection("good")).await.unwrap();
        store.get(&id).await.unwrap().lock().await.select_bucket("A");

        let (same, _) = store
            .open(Some(id.clone()), connection("good"))
            .await
            .unwrap();
        assert_eq!(same, id);
        let session = store.get(&id).await.unwrap();
        assert_eq!(session.lock().await.selected_bucket(), None);
    }

    #[tokio::test]
    async fn test_unissued_id_is_not_adopted() {
        let store = SessionStore::new(connector(), HOUR);
        let chosen = SessionId::generate();

        let (id, _) = store
            .open(Some(chosen.clone()), connection("good"))
            .await
            .unwrap();
        assert_ne!(id, chosen);
        assert!(matches!(store.get(&chosen).await, Err(Error::NoSession)));
        assert!(store.get(&id).await.is_ok());
    }

    #[tokio::test]
    async fn test_full_store_evicts_least_recently_used() {
        let store = SessionStore::new(connector(), HOUR).with_max_sessions(2);
        let (first, _) = store.open(None, connection("good")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let (second, _) = store.open(None, connection("good")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        // touching the first session makes the second the oldest
        store.get(&first).await.unwrap();
        let (third, _) = store.open(None, connection("good")).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert!(store.get(&first).await.is_ok());
        assert!(matches!(store.get(&second).await, Err(Error::NoSession)));
        assert!(store.get(&third).await.is_ok());
    }

    #[tokio::test]
    async fn test_default_connection_sessions_are_capped() {
        let store = SessionStore::new(connector(), HOUR)
            .with_max_sessions(3)
            .with_default_connection(connection("good"));

        for _ in 0..10 {
            assert!(store.resolve(None).await.unwrap().created);
        }
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new(connector(), HOUR);
        let (first, _) = store.open(None, connection("good")).await.unwrap();
        let (second, _) = store.open(None, connection("good")).await.unwrap();
        assert_ne!(first, second);

        store.get(&first).await.unwrap().lock().await.select_bucket("A");
        store.get(&second).await.unwrap().lock().await.select_bucket("B");

        let first = store.get(&first).await.unwrap();
        let second = store.get(&second).await.unwrap();
        assert_eq!(first.lock().await.selected_bucket(), Some("A"));
        assert_eq!(second.lock().await.selected_bucket(), Some("B"));
    }

    #[tokio::test]
    async fn test_clear() {
        let store = SessionStore::new(connector(), HOUR);
        let (id, _) = store.open(None, connection("good")).await.unwrap();
        assert!(store.clear(&id).await);
        assert!(!store.clear(&id).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let store = SessionStore::new(connector(), Duration::from_millis(20));
        let (id, _) = store.open(None, connection("good")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(matches!(store.get(&id).await, Err(Error::NoSession)));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_resolve_without_default_connection() {
        let store = SessionStore::new(connector(), HOUR);
        assert!(matches!(store.resolve(None).await, Err(Error::NoSession)));
    }

    #[tokio::test]
    async fn test_resolve_uses_default_connection() {
        let store =
            SessionStore::new(connector(), HOUR).with_default_connection(connection("good"));

        let resolved = store.resolve(None).await.unwrap();
        assert!(resolved.created);

        let again = store.resolve(Some(&resolved.id)).await.unwrap();
        assert!(!again.created);
        assert_eq!(again.id, resolved.id);
    }

    #[test]
    fn test_session_id_parse() {
        let id = SessionId::generate();
        assert_eq!(SessionId::parse(id.as_str()), Some(id.clone()));
        assert_eq!(SessionId::parse(&format!(" {id} ")), Some(id));
        assert!(SessionId::parse("not-a-session").is_none());
    }
}
