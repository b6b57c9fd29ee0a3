//! In-memory storage backend.

use std::collections::{BTreeMap, VecDeque};
use std::ops::{Bound, RangeBounds};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use super::{
    Record, RecordOp, Storage, StorageError, StorageIterator, StorageRead, StorageResult,
    WriteOptions,
};
use crate::BytesRange;

/// A `BTreeMap` behind a lock. Batches are applied under a single write
/// guard, so they are atomic with respect to readers.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    data: Arc<RwLock<BTreeMap<Bytes, Bytes>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Records copied out of the map per read guard during a scan.
const SCAN_CHUNK: usize = 256;

fn poisoned() -> StorageError {
    StorageError::Internal("in-memory storage lock poisoned".to_string())
}

#[async_trait]
impl StorageRead for InMemoryStorage {
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>> {
        let data = self.data.read().map_err(|_| poisoned())?;
        Ok(data.get(&key).map(|v| Record::new(key.clone(), v.clone())))
    }

    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + 'static>> {
        Ok(Box::new(InMemoryIterator::new(
            Arc::clone(&self.data),
            range,
            SCAN_CHUNK,
        )))
    }
}

/// Lazy range iterator.
///
/// Copies at most `chunk` records per refill and resumes after the last key
/// it returned. Each chunk is read under its own guard, so a long scan sees
/// writes that land between refills.
struct InMemoryIterator {
    data: Arc<RwLock<BTreeMap<Bytes, Bytes>>>,
    start: Bound<Bytes>,
    end: Bound<Bytes>,
    chunk: usize,
    buffer: VecDeque<Record>,
    done: bool,
}

impl InMemoryIterator {
    fn new(data: Arc<RwLock<BTreeMap<Bytes, Bytes>>>, range: BytesRange, chunk: usize) -> Self {
        let done = range.is_empty();
        Self {
            data,
            start: range.start_bound().cloned(),
            end: range.end_bound().cloned(),
            chunk,
            buffer: VecDeque::new(),
            done,
        }
    }

    fn refill(&mut self) -> StorageResult<()> {
        let data = self.data.read().map_err(|_| poisoned())?;
        let range = BytesRange::new(self.start.clone(), self.end.clone());
        if range.is_empty() {
            self.done = true;
            return Ok(());
        }
        self.buffer.extend(
            data.range(range)
                .take(self.chunk)
                .map(|(k, v)| Record::new(k.clone(), v.clone())),
        );
        match self.buffer.back() {
            Some(last) if self.buffer.len() == self.chunk => {
                self.start = Bound::Excluded(last.key.clone());
            }
            _ => self.done = true,
        }
        Ok(())
    }
}

#[async_trait]
impl StorageIterator for InMemoryIterator {
    async fn next(&mut self) -> StorageResult<Option<Record>> {
        if self.buffer.is_empty() && !self.done {
            self.refill()?;
        }
        Ok(self.buffer.pop_front())
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn apply_with_options(
        &self,
        ops: Vec<RecordOp>,
        _options: WriteOptions,
    ) -> StorageResult<()> {
        let mut data = self.data.write().map_err(|_| poisoned())?;
        for op in ops {
            match op {
                RecordOp::Put(record) => {
                    data.insert(record.key, record.value);
                }
                RecordOp::Delete(key) => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}
