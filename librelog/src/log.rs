//! Core log implementation with read and write APIs.
//!
//! This module provides [`LogDb`], the entry point for appending records,
//! reading partitions through the [`LogRead`] trait, and managing the
//! logset catalog and tokens that share the same store.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use common::clock::{Clock, SystemClock};
use common::storage::factory::create_storage;
use common::{Record, RecordOp, Storage};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::catalog::{CatalogCache, logset_from};
use crate::config::{Config, WriteOptions};
use crate::credentials::CredentialGate;
use crate::error::{Error, Result};
use crate::model::{LogRecord, Logset, OwnerId, datetime_from_micros};
use crate::reader::{LogRead, RangeQuery};
use crate::receipt::ReceiptClock;
use crate::serde::{LogRecordKey, LogsetMetaKey, LogsetMetaValue};
use crate::storage::LogStorage;

/// Records deleted per batch when a logset is removed.
const DELETE_BATCH: usize = 1000;

/// Inner state for the write path.
///
/// Wrapped in a single `RwLock`. Holding the write guard across the storage
/// write keeps receipt timestamps in the same order as the batches that
/// carry them.
struct LogInner {
    receipt_clock: ReceiptClock,
    catalog: CatalogCache,
}

/// The log store.
///
/// Records are partitioned by `(owner, logset)`. Within a partition they are
/// ordered by their receipt time, which the store assigns on append and
/// which is unique across the store.
///
/// # Thread Safety
///
/// `LogDb` is shared across tasks behind an `Arc`. All methods take `&self`.
/// Appends are serialized; reads run against storage snapshots and never
/// wait on the write path.
///
/// # Example
///
/// ```ignore
/// use librelog::{Config, LogDb, LogRead, RangeQuery};
///
/// let db = LogDb::open(Config::default()).await?;
/// let owner = OwnerId::generate();
/// db.append(&owner, "app", Bytes::from(r#"{"cpu":12}"#)).await?;
///
/// let page = db.range_query(&owner, "app", &RangeQuery::latest(100)?).await?;
/// ```
pub struct LogDb {
    storage: LogStorage,
    clock: Arc<dyn Clock>,
    options: WriteOptions,
    credentials: CredentialGate,
    inner: RwLock<LogInner>,
}

impl LogDb {
    /// Opens or creates a log store with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be initialized or the
    /// receipt watermark cannot be read.
    pub async fn open(config: Config) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Opens the store with a custom clock.
    pub async fn open_with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let storage = create_storage(&config.storage).await?;
        Self::with_storage(storage, clock, config.write_options()).await
    }

    /// Builds a store over an already-open storage backend.
    pub async fn with_storage(
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        options: WriteOptions,
    ) -> Result<Self> {
        let storage = LogStorage::new(storage);
        let receipt_clock = ReceiptClock::open(&storage).await?;
        tracing::debug!(
            "Opened log store, receipt watermark {:?}",
            receipt_clock.last()
        );
        let credentials = CredentialGate::new(storage.clone(), Arc::clone(&clock), options);
        let inner = LogInner {
            receipt_clock,
            catalog: CatalogCache::new(),
        };
        Ok(Self {
            storage,
            clock,
            options,
            credentials,
            inner: RwLock::new(inner),
        })
    }

    /// Token authentication and management over the same store.
    pub fn credentials(&self) -> &CredentialGate {
        &self.credentials
    }

    /// Appends one payload to a logset using the store's default write options.
    ///
    /// Returns the stored record, including its assigned receipt time.
    pub async fn append(&self, owner: &OwnerId, logset: &str, payload: Bytes) -> Result<LogRecord> {
        self.append_with_options(owner, logset, payload, self.options)
            .await
    }

    /// Appends one payload to a logset with custom options.
    ///
    /// The record, its logset's registration (on first use) and the receipt
    /// watermark are written in one atomic batch. An error means nothing was
    /// stored.
    pub async fn append_with_options(
        &self,
        owner: &OwnerId,
        logset: &str,
        payload: Bytes,
        options: WriteOptions,
    ) -> Result<LogRecord> {
        validate_logset_id(logset)?;

        let mut inner = self.inner.write().await;
        let now_micros = self.clock.now_micros();

        // Three-phase commit: build (fallible) → write (fatal) → apply (infallible).

        // Build phase: accumulate deltas and storage ops.
        let mut ops: Vec<RecordOp> = Vec::new();
        let receipt_delta = inner.receipt_clock.build_delta(now_micros, 1, &mut ops);
        let received_micros = receipt_delta.stamps()[0];
        let catalog_delta = inner
            .catalog
            .build_delta(&self.storage, owner, logset, received_micros, &mut ops)
            .await?;
        let key = LogRecordKey::new(
            *owner,
            Bytes::copy_from_slice(logset.as_bytes()),
            received_micros,
        );
        ops.push(RecordOp::Put(Record::new(key.serialize(), payload.clone())));
        let received_at = datetime_from_micros(received_micros)?;

        // Write phase: atomic write to storage.
        self.storage.apply(ops, options).await?;

        // Apply phase: update in-memory state.
        inner.receipt_clock.apply_delta(receipt_delta);
        inner.catalog.apply_delta(catalog_delta);

        Ok(LogRecord {
            owner: *owner,
            logset: logset.to_string(),
            received_at,
            payload,
        })
    }

    /// Creates a logset with a generated id.
    pub async fn create_logset(
        &self,
        owner: &OwnerId,
        name: &str,
        description: &str,
    ) -> Result<Logset> {
        let name = validate_name(name)?;
        let id = Uuid::now_v7().to_string();
        let value = LogsetMetaValue {
            name,
            description: description.to_string(),
            created_micros: self.clock.now_micros(),
        };

        let mut inner = self.inner.write().await;
        self.put_logset(owner, &id, &value).await?;
        inner.catalog.insert(*owner, id.clone());
        tracing::info!("Created logset {} for owner {}", id, owner);

        Ok(logset_from(*owner, id.as_bytes(), value))
    }

    pub async fn get_logset(&self, owner: &OwnerId, id: &str) -> Result<Logset> {
        match self.storage.get_logset(owner, id).await? {
            Some(value) => Ok(logset_from(*owner, id.as_bytes(), value)),
            None => Err(logset_not_found(id)),
        }
    }

    /// Lists the owner's logsets ordered by id.
    pub async fn list_logsets(&self, owner: &OwnerId) -> Result<Vec<Logset>> {
        Ok(self
            .storage
            .scan_logsets(owner)
            .await?
            .into_iter()
            .map(|(key, value)| logset_from(key.owner, &key.logset, value))
            .collect())
    }

    /// Updates a logset's name and/or description.
    pub async fn update_logset(
        &self,
        owner: &OwnerId,
        id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Logset> {
        let _inner = self.inner.write().await;
        let Some(mut value) = self.storage.get_logset(owner, id).await? else {
            return Err(logset_not_found(id));
        };
        if let Some(name) = name {
            value.name = validate_name(name)?;
        }
        if let Some(description) = description {
            value.description = description.to_string();
        }
        self.put_logset(owner, id, &value).await?;
        Ok(logset_from(*owner, id.as_bytes(), value))
    }

    /// Deletes a logset together with all of its records.
    ///
    /// Only the metadata removal happens under the write lock. Records are
    /// purged afterwards, bounded by the receipt watermark at the moment of
    /// removal, so appends to other logsets are not held up and records of a
    /// logset re-created under the same id are left alone.
    pub async fn delete_logset(&self, owner: &OwnerId, id: &str) -> Result<()> {
        let cutoff = {
            let mut inner = self.inner.write().await;
            if self.storage.get_logset(owner, id).await?.is_none() {
                return Err(logset_not_found(id));
            }
            let meta_key = LogsetMetaKey::new(*owner, Bytes::copy_from_slice(id.as_bytes()));
            self.storage
                .apply(vec![RecordOp::Delete(meta_key.serialize())], self.options)
                .await?;
            inner.catalog.remove(owner, id);
            inner.receipt_clock.last()
        };

        let deleted = match cutoff {
            Some(last) => self.purge_records(owner, id, last.saturating_add(1)).await?,
            None => 0,
        };
        tracing::info!(
            "Deleted logset {} for owner {} ({} records)",
            id,
            owner,
            deleted
        );
        Ok(())
    }

    /// Deletes a partition's records received before `before_micros`, in batches.
    async fn purge_records(&self, owner: &OwnerId, id: &str, before_micros: i64) -> Result<usize> {
        let mut deleted = 0usize;
        loop {
            let keys = self
                .storage
                .record_keys(owner, id, Some(before_micros), DELETE_BATCH)
                .await?;
            if keys.is_empty() {
                return Ok(deleted);
            }
            deleted += keys.len();
            let ops = keys.into_iter().map(RecordOp::Delete).collect();
            if let Err(e) = self.storage.apply(ops, self.options).await {
                tracing::error!(
                    "Failed to purge records of deleted logset {} for owner {}: {}",
                    id,
                    owner,
                    e
                );
                return Err(e);
            }
        }
    }

    /// Closes the underlying storage, flushing pending writes.
    pub async fn close(&self) -> Result<()> {
        self.storage.close().await
    }

    async fn put_logset(&self, owner: &OwnerId, id: &str, value: &LogsetMetaValue) -> Result<()> {
        let key = LogsetMetaKey::new(*owner, Bytes::copy_from_slice(id.as_bytes()));
        let op = RecordOp::Put(Record::new(key.serialize(), value.serialize()));
        self.storage.apply(vec![op], self.options).await
    }
}

#[async_trait]
impl LogRead for LogDb {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn range_query(
        &self,
        owner: &OwnerId,
        logset: &str,
        query: &RangeQuery,
    ) -> Result<Vec<LogRecord>> {
        self.storage
            .scan_records(
                owner,
                logset,
                query.before_micros(),
                query.after_micros(),
                query.limit(),
            )
            .await
    }

    async fn logset_exists(&self, owner: &OwnerId, logset: &str) -> Result<bool> {
        Ok(self.storage.get_logset(owner, logset).await?.is_some())
    }
}

fn validate_logset_id(logset: &str) -> Result<()> {
    if logset.is_empty() {
        return Err(Error::InvalidInput("log_set must not be empty".to_string()));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

fn logset_not_found(id: &str) -> Error {
    Error::NotFound(format!("logset {} not found", id))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::{Duration, UNIX_EPOCH};

    use common::StorageConfig;
    use common::clock::MockClock;
    use common::storage::in_memory::InMemoryStorage;

    use super::*;

    fn test_config() -> Config {
        Config {
            storage: StorageConfig::InMemory,
            ..Default::default()
        }
    }

    async fn open_with_mock_clock() -> (LogDb, Arc<MockClock>) {
        let clock = Arc::new(MockClock::with_time(
            UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        ));
        let db = LogDb::open_with_clock(test_config(), clock.clone())
            .await
            .unwrap();
        (db, clock)
    }

    fn payloads(records: &[LogRecord]) -> Vec<&[u8]> {
        records.iter().map(|r| r.payload.as_ref()).collect()
    }

    #[tokio::test]
    async fn should_open_log_with_in_memory_config() {
        // given
        let config = test_config();

        // when
        let result = LogDb::open(config).await;

        // then
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn should_append_and_read_back_record() {
        // given
        let (db, _) = open_with_mock_clock().await;
        let owner = OwnerId::generate();

        // when
        let stored = db
            .append(&owner, "app", Bytes::from(r#"{"cpu":12}"#))
            .await
            .unwrap();

        // then
        let page = db
            .range_query(&owner, "app", &RangeQuery::latest(100).unwrap())
            .await
            .unwrap();
        assert_eq!(page, vec![stored]);
        assert_eq!(page[0].received_at.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn should_return_records_newest_first() {
        // given
        let (db, clock) = open_with_mock_clock().await;
        let owner = OwnerId::generate();
        for payload in ["a", "b", "c"] {
            db.append(&owner, "app", Bytes::from(payload)).await.unwrap();
            clock.advance(Duration::from_millis(1));
        }

        // when
        let page = db
            .range_query(&owner, "app", &RangeQuery::latest(100).unwrap())
            .await
            .unwrap();

        // then
        assert_eq!(payloads(&page), vec![&b"c"[..], &b"b"[..], &b"a"[..]]);
    }

    #[tokio::test]
    async fn should_assign_unique_timestamps_within_same_microsecond() {
        // given - the clock never moves
        let (db, _) = open_with_mock_clock().await;
        let owner = OwnerId::generate();

        // when
        for i in 0..10 {
            db.append(&owner, "app", Bytes::from(format!("{}", i)))
                .await
                .unwrap();
        }

        // then
        let page = db
            .range_query(&owner, "app", &RangeQuery::latest(100).unwrap())
            .await
            .unwrap();
        let stamps: HashSet<_> = page.iter().map(|r| r.received_at).collect();
        assert_eq!(stamps.len(), 10);
        assert_eq!(page[0].payload, Bytes::from("9"));
    }

    #[tokio::test]
    async fn should_keep_ordering_when_clock_steps_backwards() {
        // given
        let (db, clock) = open_with_mock_clock().await;
        let owner = OwnerId::generate();
        let first = db.append(&owner, "app", Bytes::from("a")).await.unwrap();
        clock.rewind(Duration::from_secs(60));

        // when
        let second = db.append(&owner, "app", Bytes::from("b")).await.unwrap();

        // then
        assert!(second.received_at > first.received_at);
    }

    #[tokio::test]
    async fn should_apply_exclusive_before_and_after_bounds() {
        // given
        let (db, clock) = open_with_mock_clock().await;
        let owner = OwnerId::generate();
        let mut stored = Vec::new();
        for i in 0..5 {
            stored.push(
                db.append(&owner, "app", Bytes::from(format!("{}", i)))
                    .await
                    .unwrap(),
            );
            clock.advance(Duration::from_secs(1));
        }

        // when
        let query = RangeQuery::new(
            100,
            Some(stored[4].received_at),
            Some(stored[1].received_at),
        )
        .unwrap();
        let page = db.range_query(&owner, "app", &query).await.unwrap();

        // then
        assert_eq!(payloads(&page), vec![&b"3"[..], &b"2"[..]]);
    }

    #[tokio::test]
    async fn should_return_empty_page_when_after_not_below_before() {
        // given
        let (db, _) = open_with_mock_clock().await;
        let owner = OwnerId::generate();
        let stored = db.append(&owner, "app", Bytes::from("a")).await.unwrap();

        // when
        let query = RangeQuery::new(10, Some(stored.received_at), Some(stored.received_at))
            .unwrap();
        let page = db.range_query(&owner, "app", &query).await.unwrap();

        // then
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn should_limit_page_length() {
        // given
        let (db, _) = open_with_mock_clock().await;
        let owner = OwnerId::generate();
        for i in 0..20 {
            db.append(&owner, "app", Bytes::from(format!("{}", i)))
                .await
                .unwrap();
        }

        // when
        let page = db
            .range_query(&owner, "app", &RangeQuery::latest(7).unwrap())
            .await
            .unwrap();

        // then
        assert_eq!(page.len(), 7);
        assert!(page.windows(2).all(|w| w[0].received_at > w[1].received_at));
    }

    #[tokio::test]
    async fn should_isolate_partitions_by_owner_and_logset() {
        // given
        let (db, _) = open_with_mock_clock().await;
        let alice = OwnerId::generate();
        let bob = OwnerId::generate();
        db.append(&alice, "app", Bytes::from("alice")).await.unwrap();
        db.append(&bob, "app", Bytes::from("bob")).await.unwrap();
        db.append(&alice, "app2", Bytes::from("other")).await.unwrap();

        // when
        let page = db
            .range_query(&alice, "app", &RangeQuery::latest(100).unwrap())
            .await
            .unwrap();

        // then
        assert_eq!(payloads(&page), vec![&b"alice"[..]]);
    }

    #[tokio::test]
    async fn should_reject_empty_logset_id() {
        let (db, _) = open_with_mock_clock().await;
        let result = db.append(&OwnerId::generate(), "", Bytes::from("x")).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn should_store_every_concurrent_append_exactly_once() {
        // given
        let (db, _) = open_with_mock_clock().await;
        let db = Arc::new(db);
        let owner = OwnerId::generate();

        // when
        let mut handles = Vec::new();
        for i in 0..50 {
            let db = Arc::clone(&db);
            handles.push(tokio::spawn(async move {
                db.append(&owner, "app", Bytes::from(format!("{}", i)))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // then
        let page = db
            .range_query(&owner, "app", &RangeQuery::latest(1000).unwrap())
            .await
            .unwrap();
        let distinct: HashSet<_> = page.iter().map(|r| r.payload.clone()).collect();
        assert_eq!(page.len(), 50);
        assert_eq!(distinct.len(), 50);
    }

    #[tokio::test]
    async fn should_continue_above_watermark_after_reopen() {
        // given
        let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let clock = Arc::new(MockClock::with_time(
            UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        ));
        let owner = OwnerId::generate();
        let db = LogDb::with_storage(storage.clone(), clock.clone(), WriteOptions::default())
            .await
            .unwrap();
        let first = db.append(&owner, "app", Bytes::from("a")).await.unwrap();
        clock.rewind(Duration::from_secs(3600));

        // when
        let reopened = LogDb::with_storage(storage, clock, WriteOptions::default())
            .await
            .unwrap();
        let second = reopened
            .append(&owner, "app", Bytes::from("b"))
            .await
            .unwrap();

        // then
        assert!(second.received_at > first.received_at);
    }

    #[tokio::test]
    async fn should_register_logset_on_first_append() {
        // given
        let (db, _) = open_with_mock_clock().await;
        let owner = OwnerId::generate();

        // when
        db.append(&owner, "ram", Bytes::from("{}")).await.unwrap();

        // then
        assert!(db.logset_exists(&owner, "ram").await.unwrap());
        assert!(!db.logset_exists(&OwnerId::generate(), "ram").await.unwrap());
        let logset = db.get_logset(&owner, "ram").await.unwrap();
        assert_eq!(logset.name, "ram");
    }

    #[tokio::test]
    async fn should_create_update_and_list_logsets() {
        // given
        let (db, _) = open_with_mock_clock().await;
        let owner = OwnerId::generate();
        let created = db.create_logset(&owner, "RAM", "").await.unwrap();

        // when
        let updated = db
            .update_logset(&owner, &created.id, None, Some("percent used"))
            .await
            .unwrap();

        // then
        assert_eq!(updated.name, "RAM");
        assert_eq!(updated.description, "percent used");
        let listed = db.list_logsets(&owner).await.unwrap();
        assert_eq!(listed, vec![updated]);
        assert!(db.list_logsets(&OwnerId::generate()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_delete_logset_and_its_records() {
        // given
        let (db, _) = open_with_mock_clock().await;
        let owner = OwnerId::generate();
        for i in 0..5 {
            db.append(&owner, "app", Bytes::from(format!("{}", i)))
                .await
                .unwrap();
        }

        // when
        db.delete_logset(&owner, "app").await.unwrap();

        // then
        assert!(!db.logset_exists(&owner, "app").await.unwrap());
        let page = db
            .range_query(&owner, "app", &RangeQuery::latest(100).unwrap())
            .await
            .unwrap();
        assert!(page.is_empty());
        assert!(matches!(
            db.delete_logset(&owner, "app").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn should_reregister_logset_appended_after_delete() {
        // given
        let (db, _) = open_with_mock_clock().await;
        let owner = OwnerId::generate();
        db.append(&owner, "app", Bytes::from("a")).await.unwrap();
        db.delete_logset(&owner, "app").await.unwrap();

        // when
        db.append(&owner, "app", Bytes::from("b")).await.unwrap();

        // then
        assert!(db.logset_exists(&owner, "app").await.unwrap());
    }

    /// Holds back large write batches until released.
    struct GatedStorage {
        inner: InMemoryStorage,
        gate: Arc<tokio::sync::Semaphore>,
    }

    #[async_trait]
    impl common::StorageRead for GatedStorage {
        async fn get(&self, key: Bytes) -> common::StorageResult<Option<Record>> {
            self.inner.get(key).await
        }

        async fn scan_iter(
            &self,
            range: common::BytesRange,
        ) -> common::StorageResult<Box<dyn common::StorageIterator + Send + 'static>> {
            self.inner.scan_iter(range).await
        }
    }

    #[async_trait]
    impl Storage for GatedStorage {
        async fn apply_with_options(
            &self,
            ops: Vec<RecordOp>,
            options: common::WriteOptions,
        ) -> common::StorageResult<()> {
            if ops.len() > 100 {
                if let Ok(permit) = self.gate.acquire().await {
                    permit.forget();
                }
            }
            self.inner.apply_with_options(ops, options).await
        }

        async fn close(&self) -> common::StorageResult<()> {
            Ok(())
        }
    }

    async fn open_gated() -> (Arc<LogDb>, Arc<tokio::sync::Semaphore>) {
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let storage = Arc::new(GatedStorage {
            inner: InMemoryStorage::new(),
            gate: Arc::clone(&gate),
        });
        let clock = Arc::new(MockClock::with_time(
            UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        ));
        let db = LogDb::with_storage(storage, clock, WriteOptions::default())
            .await
            .unwrap();
        (Arc::new(db), gate)
    }

    #[tokio::test]
    async fn should_not_block_other_appends_while_purging_records() {
        // given
        let (db, gate) = open_gated().await;
        let alice = OwnerId::generate();
        let bob = OwnerId::generate();
        for i in 0..1500 {
            db.append(&alice, "app", Bytes::from(format!("{}", i)))
                .await
                .unwrap();
        }
        let deleting = {
            let db = Arc::clone(&db);
            tokio::spawn(async move { db.delete_logset(&alice, "app").await })
        };

        // when
        let appended = tokio::time::timeout(
            Duration::from_secs(5),
            db.append(&bob, "metrics", Bytes::from("1")),
        )
        .await;

        // then
        assert!(appended.expect("append waited on the purge").is_ok());
        assert!(!deleting.is_finished());
        gate.add_permits(10);
        deleting.await.unwrap().unwrap();
        let page = db
            .range_query(&alice, "app", &RangeQuery::latest(10).unwrap())
            .await
            .unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn should_keep_records_of_logset_recreated_during_purge() {
        // given
        let (db, gate) = open_gated().await;
        let owner = OwnerId::generate();
        for i in 0..1200 {
            db.append(&owner, "app", Bytes::from(format!("{}", i)))
                .await
                .unwrap();
        }
        let deleting = {
            let db = Arc::clone(&db);
            tokio::spawn(async move { db.delete_logset(&owner, "app").await })
        };
        while db.logset_exists(&owner, "app").await.unwrap() {
            tokio::task::yield_now().await;
        }

        // when
        db.append(&owner, "app", Bytes::from("fresh")).await.unwrap();
        gate.add_permits(10);
        deleting.await.unwrap().unwrap();

        // then
        let page = db
            .range_query(&owner, "app", &RangeQuery::latest(10).unwrap())
            .await
            .unwrap();
        assert_eq!(payloads(&page), vec![&b"fresh"[..]]);
        assert!(db.logset_exists(&owner, "app").await.unwrap());
    }
}
