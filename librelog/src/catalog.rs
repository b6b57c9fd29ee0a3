//! Logset catalog.
//!
//! Each logset an owner writes to has a metadata record holding its display
//! name and description. Logsets named for the first time by an ingest are
//! registered in the same batch as the record that names them, with the id
//! doubling as the name. The [`CatalogCache`] remembers which partitions are
//! known to be registered so the write path only touches storage once per
//! logset.

use std::collections::HashSet;

use bytes::Bytes;
use common::{Record, RecordOp};

use crate::error::Result;
use crate::model::{Logset, OwnerId};
use crate::serde::{LogsetMetaKey, LogsetMetaValue};
use crate::storage::LogStorage;

/// Logset registrations produced by one append.
///
/// Produced by [`CatalogCache::build_delta`] and consumed by
/// [`CatalogCache::apply_delta`].
#[derive(Debug, Default)]
pub(crate) struct CatalogDelta {
    known: Vec<(OwnerId, String)>,
}

#[derive(Debug, Default)]
pub(crate) struct CatalogCache {
    known: HashSet<(OwnerId, String)>,
}

impl CatalogCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn contains(&self, owner: &OwnerId, logset: &str) -> bool {
        self.known.contains(&(*owner, logset.to_string()))
    }

    /// Adds a metadata record to `ops` if the logset has never been registered.
    ///
    /// Does NOT update the cache; call `apply_delta()` after the storage
    /// write succeeds.
    pub(crate) async fn build_delta(
        &self,
        storage: &LogStorage,
        owner: &OwnerId,
        logset: &str,
        created_micros: i64,
        ops: &mut Vec<RecordOp>,
    ) -> Result<CatalogDelta> {
        let mut delta = CatalogDelta::default();
        if self.contains(owner, logset) {
            return Ok(delta);
        }
        if storage.get_logset(owner, logset).await?.is_none() {
            let key = LogsetMetaKey::new(*owner, Bytes::copy_from_slice(logset.as_bytes()));
            let value = LogsetMetaValue {
                name: logset.to_string(),
                description: String::new(),
                created_micros,
            };
            ops.push(RecordOp::Put(Record::new(key.serialize(), value.serialize())));
        }
        delta.known.push((*owner, logset.to_string()));
        Ok(delta)
    }

    pub(crate) fn apply_delta(&mut self, delta: CatalogDelta) {
        self.known.extend(delta.known);
    }

    pub(crate) fn insert(&mut self, owner: OwnerId, logset: String) {
        self.known.insert((owner, logset));
    }

    pub(crate) fn remove(&mut self, owner: &OwnerId, logset: &str) {
        self.known.remove(&(*owner, logset.to_string()));
    }
}

/// Builds the public view of a metadata record.
pub(crate) fn logset_from(owner: OwnerId, id: &[u8], value: LogsetMetaValue) -> Logset {
    Logset {
        id: String::from_utf8_lossy(id).into_owned(),
        owner,
        name: value.name,
        description: value.description,
    }
}
