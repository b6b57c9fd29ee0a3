//! librelog - authenticated log ingestion and retrieval over SlateDB.
//!
//! Clients push JSON envelopes (`{"log_set": ..., "data": ...}`) over a
//! WebSocket or a plain POST. Each accepted message becomes a [`LogRecord`]
//! stamped with a server receipt time and stored in a partition keyed by
//! `(owner, logset)`. Records are read back newest first, either a page at a
//! time through [`query_logs`] or in full through [`export_logset`], which
//! streams JSON or CSV without holding the logset in memory.
//!
//! # Architecture
//!
//! All state lives in one ordered key-value store. Record keys end in an
//! inverted receipt timestamp, so a forward scan of a partition yields the
//! newest record first and a time range maps to a single contiguous key
//! range. Receipt times come from a monotonic clock whose high-water mark is
//! persisted with every write, which keeps them unique across restarts even
//! when the wall clock steps backwards.
//!
//! Tokens are never stored. The store keeps a SHA-256 digest of each token
//! and [`CredentialGate::authenticate`] resolves a presented token to the
//! [`OwnerId`] that every read and write is scoped by.
//!
//! # Example
//!
//! ```ignore
//! use bytes::Bytes;
//! use librelog::{Config, LogDb, LogRead, OwnerId, RangeQuery};
//!
//! let log = LogDb::open(Config::default()).await?;
//! let issued = log.credentials().issue(OwnerId::generate(), "ci").await?;
//! let owner = log.credentials().authenticate(&issued.token).await?;
//!
//! log.append(&owner, "app", Bytes::from(r#"{"msg":"hi"}"#)).await?;
//! let records = log.range_query(&owner, "app", &RangeQuery::latest(10)?).await?;
//! ```

mod catalog;
mod config;
mod credentials;
mod error;
mod export;
mod log;
mod model;
mod query;
mod reader;
mod receipt;
mod serde;
#[cfg(feature = "http-server")]
pub mod server;
mod storage;

pub use config::{Config, WriteOptions};
pub use credentials::{CredentialGate, token_digest};
pub use error::{Error, Result};
pub use export::{
    DataView, EXPORT_PAGE_SIZE, ExportChunk, ExportFormat, ExportStream, PageCursor, RecordView,
    export_logset, export_stream,
};
pub use log::LogDb;
pub use model::{ApiKey, IssuedToken, LogRecord, Logset, OwnerId, format_timestamp};
pub use query::{QueryParams, parse_timestamp, query_logs};
pub use reader::{DEFAULT_LIMIT, LogRead, MAX_LIMIT, RangeQuery};
