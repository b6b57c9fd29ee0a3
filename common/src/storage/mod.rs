//! Key-value storage abstraction.
//!
//! Services talk to storage through [`Storage`] (read-write) or
//! [`StorageRead`] (read-only). Writes are applied as atomic batches of
//! [`RecordOp`]s; reads are point lookups or ordered range scans.

pub mod config;
pub mod factory;
pub mod in_memory;
pub mod slate;

use async_trait::async_trait;
use bytes::Bytes;

use crate::BytesRange;

/// A single key-value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Bytes,
    pub value: Bytes,
}

impl Record {
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }
}

/// A mutation inside a write batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOp {
    Put(Record),
    Delete(Bytes),
}

/// Options for write operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Wait until the batch is durable before returning.
    pub await_durable: bool,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Wraps a backend error.
    pub fn from_storage(e: impl std::fmt::Display) -> Self {
        StorageError::Storage(e.to_string())
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Ordered iterator over records returned by a scan.
#[async_trait]
pub trait StorageIterator {
    async fn next(&mut self) -> StorageResult<Option<Record>>;
}

/// Read operations.
#[async_trait]
pub trait StorageRead: Send + Sync {
    /// Point lookup. Returns `None` if the key does not exist.
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>>;

    /// Scans keys in `range` in ascending byte order.
    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + 'static>>;
}

/// Read-write operations.
#[async_trait]
pub trait Storage: StorageRead {
    /// Applies all operations atomically.
    async fn apply_with_options(
        &self,
        ops: Vec<RecordOp>,
        options: WriteOptions,
    ) -> StorageResult<()>;

    async fn apply(&self, ops: Vec<RecordOp>) -> StorageResult<()> {
        self.apply_with_options(ops, WriteOptions::default()).await
    }

    /// Flushes and releases the backend.
    async fn close(&self) -> StorageResult<()>;
}
