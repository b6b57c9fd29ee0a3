//! Log-specific storage wrapper.
//!
//! [`LogStorage`] wraps the generic storage trait with typed accessors for
//! log records, logset metadata, credentials and the receipt watermark.

use std::sync::Arc;

use bytes::Bytes;
use common::{BytesRange, Record, RecordOp, Storage};

use crate::config::WriteOptions;
use crate::error::Result;
use crate::model::{LogRecord, OwnerId, datetime_from_micros};
use crate::serde::{
    CredentialKey, CredentialValue, Digest, LogRecordKey, LogsetMetaKey, LogsetMetaValue,
    OwnerCredentialKey, RECEIPT_WATERMARK_KEY, deserialize_watermark,
};

#[derive(Clone)]
pub(crate) struct LogStorage {
    storage: Arc<dyn Storage>,
}

impl LogStorage {
    pub(crate) fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Writes a batch atomically.
    pub(crate) async fn apply(&self, ops: Vec<RecordOp>, options: WriteOptions) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }
        self.storage.apply_with_options(ops, options.into()).await?;
        Ok(())
    }

    pub(crate) async fn get(&self, key: Bytes) -> Result<Option<Record>> {
        Ok(self.storage.get(key).await?)
    }

    /// Reads the last receipt timestamp handed out, if any record was ever written.
    pub(crate) async fn get_watermark(&self) -> Result<Option<i64>> {
        match self.get(Bytes::from_static(&RECEIPT_WATERMARK_KEY)).await? {
            Some(record) => Ok(Some(deserialize_watermark(&record.value)?)),
            None => Ok(None),
        }
    }

    /// Scans up to `limit` records of one partition, newest first.
    ///
    /// `before_micros` and `after_micros` are exclusive bounds on the receipt time.
    pub(crate) async fn scan_records(
        &self,
        owner: &OwnerId,
        logset: &str,
        before_micros: Option<i64>,
        after_micros: Option<i64>,
        limit: usize,
    ) -> Result<Vec<LogRecord>> {
        let range =
            LogRecordKey::scan_range(owner, logset.as_bytes(), before_micros, after_micros);
        if range.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut iter = self.storage.scan_iter(range).await?;
        let mut records = Vec::with_capacity(limit.min(1024));
        while records.len() < limit {
            let Some(record) = iter.next().await? else {
                break;
            };
            let key = LogRecordKey::deserialize(&record.key)?;
            records.push(LogRecord {
                owner: key.owner,
                logset: logset.to_string(),
                received_at: datetime_from_micros(key.received_micros)?,
                payload: record.value,
            });
        }
        Ok(records)
    }

    /// Returns up to `batch` record keys of a partition received strictly
    /// before `before_micros`, newest first. Empty once none remain.
    pub(crate) async fn record_keys(
        &self,
        owner: &OwnerId,
        logset: &str,
        before_micros: Option<i64>,
        batch: usize,
    ) -> Result<Vec<Bytes>> {
        let range = LogRecordKey::scan_range(owner, logset.as_bytes(), before_micros, None);
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let mut iter = self.storage.scan_iter(range).await?;
        let mut keys = Vec::new();
        while keys.len() < batch {
            let Some(record) = iter.next().await? else {
                break;
            };
            keys.push(record.key);
        }
        Ok(keys)
    }

    pub(crate) async fn get_logset(
        &self,
        owner: &OwnerId,
        logset: &str,
    ) -> Result<Option<LogsetMetaValue>> {
        let key = LogsetMetaKey::new(*owner, Bytes::copy_from_slice(logset.as_bytes()));
        match self.get(key.serialize()).await? {
            Some(record) => Ok(Some(LogsetMetaValue::deserialize(&record.value)?)),
            None => Ok(None),
        }
    }

    /// Lists an owner's logsets ordered by id.
    pub(crate) async fn scan_logsets(
        &self,
        owner: &OwnerId,
    ) -> Result<Vec<(LogsetMetaKey, LogsetMetaValue)>> {
        self.scan_decoded(LogsetMetaKey::scan_owner(owner), |record| {
            Ok((
                LogsetMetaKey::deserialize(&record.key)?,
                LogsetMetaValue::deserialize(&record.value)?,
            ))
        })
        .await
    }

    pub(crate) async fn get_credential(&self, digest: &Digest) -> Result<Option<CredentialValue>> {
        match self.get(CredentialKey::new(*digest).serialize()).await? {
            Some(record) => Ok(Some(CredentialValue::deserialize(&record.value)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn scan_owner_credentials(
        &self,
        owner: &OwnerId,
    ) -> Result<Vec<(OwnerCredentialKey, CredentialValue)>> {
        self.scan_decoded(OwnerCredentialKey::scan_owner(owner), |record| {
            Ok((
                OwnerCredentialKey::deserialize(&record.key)?,
                CredentialValue::deserialize(&record.value)?,
            ))
        })
        .await
    }

    async fn scan_decoded<T>(
        &self,
        range: BytesRange,
        decode: impl Fn(Record) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut iter = self.storage.scan_iter(range).await?;
        let mut out = Vec::new();
        while let Some(record) = iter.next().await? {
            out.push(decode(record)?);
        }
        Ok(out)
    }

    pub(crate) async fn close(&self) -> Result<()> {
        self.storage.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use common::storage::in_memory::InMemoryStorage;
    use common::{StorageIterator, StorageRead, StorageResult};

    use super::*;
    use crate::serde::serialize_watermark;

    fn storage() -> LogStorage {
        LogStorage::new(Arc::new(InMemoryStorage::new()))
    }

    /// Counts records handed out by scan iterators.
    struct CountingStorage {
        inner: InMemoryStorage,
        pulled: Arc<AtomicUsize>,
    }

    struct CountingIterator {
        inner: Box<dyn StorageIterator + Send + 'static>,
        pulled: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StorageIterator for CountingIterator {
        async fn next(&mut self) -> StorageResult<Option<Record>> {
            let record = self.inner.next().await?;
            if record.is_some() {
                self.pulled.fetch_add(1, Ordering::SeqCst);
            }
            Ok(record)
        }
    }

    #[async_trait]
    impl StorageRead for CountingStorage {
        async fn get(&self, key: Bytes) -> StorageResult<Option<Record>> {
            self.inner.get(key).await
        }

        async fn scan_iter(
            &self,
            range: BytesRange,
        ) -> StorageResult<Box<dyn StorageIterator + Send + 'static>> {
            Ok(Box::new(CountingIterator {
                inner: self.inner.scan_iter(range).await?,
                pulled: Arc::clone(&self.pulled),
            }))
        }
    }

    #[async_trait]
    impl Storage for CountingStorage {
        async fn apply_with_options(
            &self,
            ops: Vec<RecordOp>,
            options: common::WriteOptions,
        ) -> StorageResult<()> {
            self.inner.apply_with_options(ops, options).await
        }

        async fn close(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    fn put(key: Bytes, value: &'static str) -> RecordOp {
        RecordOp::Put(Record::new(key, Bytes::from_static(value.as_bytes())))
    }

    #[tokio::test]
    async fn should_return_none_watermark_for_empty_store() {
        let storage = storage();
        assert_eq!(storage.get_watermark().await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_read_back_watermark() {
        // given
        let storage = storage();
        let op = RecordOp::Put(Record::new(
            Bytes::from_static(&RECEIPT_WATERMARK_KEY),
            serialize_watermark(1234),
        ));

        // when
        storage.apply(vec![op], WriteOptions::default()).await.unwrap();

        // then
        assert_eq!(storage.get_watermark().await.unwrap(), Some(1234));
    }

    #[tokio::test]
    async fn should_scan_records_newest_first_up_to_limit() {
        // given
        let storage = storage();
        let owner = OwnerId::generate();
        let ops = (1..=5)
            .map(|micros| {
                let key = LogRecordKey::new(owner, Bytes::from("app"), micros).serialize();
                put(key, "{}")
            })
            .collect();
        storage.apply(ops, WriteOptions::default()).await.unwrap();

        // when
        let records = storage
            .scan_records(&owner, "app", None, None, 3)
            .await
            .unwrap();

        // then
        let micros: Vec<_> = records
            .iter()
            .map(|r| r.received_at.timestamp_micros())
            .collect();
        assert_eq!(micros, vec![5, 4, 3]);
    }

    #[tokio::test]
    async fn should_scan_nothing_for_inverted_bounds() {
        // given
        let storage = storage();
        let owner = OwnerId::generate();
        let key = LogRecordKey::new(owner, Bytes::from("app"), 10).serialize();
        storage
            .apply(vec![put(key, "{}")], WriteOptions::default())
            .await
            .unwrap();

        // when
        let records = storage
            .scan_records(&owner, "app", Some(5), Some(20), 100)
            .await
            .unwrap();

        // then
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn should_not_read_past_limit() {
        // given
        let pulled = Arc::new(AtomicUsize::new(0));
        let storage = LogStorage::new(Arc::new(CountingStorage {
            inner: InMemoryStorage::new(),
            pulled: Arc::clone(&pulled),
        }));
        let owner = OwnerId::generate();
        let ops = (1..=2000)
            .map(|micros| {
                let key = LogRecordKey::new(owner, Bytes::from("app"), micros).serialize();
                put(key, "{}")
            })
            .collect();
        storage.apply(ops, WriteOptions::default()).await.unwrap();

        // when
        let records = storage
            .scan_records(&owner, "app", None, None, 1)
            .await
            .unwrap();

        // then
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].received_at.timestamp_micros(), 2000);
        assert_eq!(pulled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn should_list_record_keys_below_cutoff() {
        // given
        let storage = storage();
        let owner = OwnerId::generate();
        let ops = (1..=5)
            .map(|micros| {
                let key = LogRecordKey::new(owner, Bytes::from("app"), micros).serialize();
                put(key, "{}")
            })
            .collect();
        storage.apply(ops, WriteOptions::default()).await.unwrap();

        // when
        let keys = storage
            .record_keys(&owner, "app", Some(4), 10)
            .await
            .unwrap();

        // then
        let micros: Vec<_> = keys
            .iter()
            .map(|k| LogRecordKey::deserialize(k).unwrap().received_micros)
            .collect();
        assert_eq!(micros, vec![3, 2, 1]);
    }
}
