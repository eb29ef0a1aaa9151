//! sb-core: Core library for the s3-browser service
//!
//! This crate provides the core functionality for s3-browser, including:
//! - Connection parameters and configuration loading
//! - The ObjectStore trait and paged size/listing aggregation
//! - Browsing sessions and the keyed session store
//! - The error taxonomy and its user-visible tokens
//!
//! This crate is designed to be independent of any specific S3 SDK,
//! allowing for easy testing and potential future support for other backends.

pub mod config;
pub mod connection;
pub mod error;
pub mod listing;
pub mod session;
pub mod store;
pub mod traits;

pub use config::{Config, ConfigManager, LogSettings, S3Settings, ServerSettings};
pub use connection::Connection;
pub use error::{Error, ErrorToken, Result};
pub use listing::ObjectStoreExt;
pub use session::{BrowsingSession, SessionSnapshot, DELIMITER};
pub use store::{ResolvedSession, SessionHandle, SessionId, SessionStore};
pub use traits::{Connector, EntryKind, ListOptions, ListPage, ObjectEntry, ObjectStore};
