//! Read access to the log and the [`LogRead`] trait.
//!
//! This module provides:
//! - [`RangeQuery`]: a validated page request over one partition.
//! - [`LogRead`]: the trait the query and export engines read through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{LogRecord, OwnerId};

/// Largest page a single range query may return.
pub const MAX_LIMIT: usize = 1000;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_LIMIT: usize = 100;

/// A bounded read of one partition.
///
/// Selects records with `after < received_at < before`, newest first, at
/// most `limit` of them. Either bound may be absent. A query can only be
/// built with a limit in `[1, MAX_LIMIT]`, so an out-of-range limit is
/// rejected before any read is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeQuery {
    limit: usize,
    before: Option<DateTime<Utc>>,
    after: Option<DateTime<Utc>>,
}

impl RangeQuery {
    pub fn new(
        limit: usize,
        before: Option<DateTime<Utc>>,
        after: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(Error::InvalidInput(format!(
                "limit must be between 1 and {}, got {}",
                MAX_LIMIT, limit
            )));
        }
        Ok(Self {
            limit,
            before,
            after,
        })
    }

    /// The most recent `limit` records.
    pub fn latest(limit: usize) -> Result<Self> {
        Self::new(limit, None, None)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn before(&self) -> Option<DateTime<Utc>> {
        self.before
    }

    pub fn after(&self) -> Option<DateTime<Utc>> {
        self.after
    }

    /// Exclusive upper bound in whole microseconds.
    ///
    /// Rounded up: every stored instant strictly below `before` is also
    /// strictly below the rounded bound.
    pub(crate) fn before_micros(&self) -> Option<i64> {
        self.before.map(|ts| {
            let micros = ts.timestamp_micros();
            if ts.timestamp_subsec_nanos() % 1_000 != 0 {
                micros.saturating_add(1)
            } else {
                micros
            }
        })
    }

    /// Exclusive lower bound in whole microseconds, rounded down.
    pub(crate) fn after_micros(&self) -> Option<i64> {
        self.after.map(|ts| ts.timestamp_micros())
    }
}

/// Read operations on the log.
///
/// Implemented by [`LogDb`](crate::LogDb). The query and export engines are
/// written against this trait so they can be exercised with test readers.
#[async_trait]
pub trait LogRead: Send + Sync {
    /// Reads one page of a partition, newest first.
    ///
    /// A page shorter than `query.limit()` means the range is exhausted.
    async fn range_query(
        &self,
        owner: &OwnerId,
        logset: &str,
        query: &RangeQuery,
    ) -> Result<Vec<LogRecord>>;

    /// Reports whether the owner has a logset with this id.
    async fn logset_exists(&self, owner: &OwnerId, logset: &str) -> Result<bool>;
}
