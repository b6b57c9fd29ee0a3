//! Receipt timestamp assignment.
//!
//! Every accepted record is stamped with the server's receive time at
//! microsecond precision. Receipt times are strictly increasing across the
//! whole store: when two records arrive within the same microsecond, or the
//! wall clock steps backwards, the later record gets `last + 1µs`. Since
//! the receipt time is the pagination cursor, uniqueness means a page
//! boundary can never split records that share a timestamp.
//!
//! The last assigned value is persisted as a watermark in the same batch as
//! the records it covers, so a reopened store continues strictly above
//! everything it has already handed out.

use bytes::Bytes;
use common::{Record, RecordOp};

use crate::error::Result;
use crate::serde::{RECEIPT_WATERMARK_KEY, serialize_watermark};
use crate::storage::LogStorage;

/// Receipt times reserved by one append, not yet applied.
///
/// Produced by [`ReceiptClock::build_delta`] and consumed by
/// [`ReceiptClock::apply_delta`].
#[derive(Debug, Clone)]
pub(crate) struct ReceiptDelta {
    stamps: Vec<i64>,
}

impl ReceiptDelta {
    /// Timestamps for each record in the append, in input order.
    pub(crate) fn stamps(&self) -> &[i64] {
        &self.stamps
    }

    fn last(&self) -> Option<i64> {
        self.stamps.last().copied()
    }
}

/// Hands out strictly increasing receipt timestamps.
#[derive(Debug)]
pub(crate) struct ReceiptClock {
    last: Option<i64>,
}

impl ReceiptClock {
    /// Opens the clock, recovering the watermark from storage.
    pub(crate) async fn open(storage: &LogStorage) -> Result<Self> {
        let last = storage.get_watermark().await?;
        Ok(Self { last })
    }

    /// Returns the last timestamp handed out.
    pub(crate) fn last(&self) -> Option<i64> {
        self.last
    }

    /// Reserves `count` receipt timestamps starting no earlier than `now_micros`.
    ///
    /// Adds the updated watermark to `ops`. Does NOT update the clock; call
    /// `apply_delta()` after the storage write succeeds.
    pub(crate) fn build_delta(
        &self,
        now_micros: i64,
        count: usize,
        ops: &mut Vec<RecordOp>,
    ) -> ReceiptDelta {
        let mut stamps = Vec::with_capacity(count);
        let mut prev = self.last;
        for _ in 0..count {
            let next = match prev {
                Some(last) if now_micros <= last => last + 1,
                _ => now_micros,
            };
            stamps.push(next);
            prev = Some(next);
        }

        let delta = ReceiptDelta { stamps };
        if let Some(last) = delta.last() {
            ops.push(RecordOp::Put(Record::new(
                Bytes::from_static(&RECEIPT_WATERMARK_KEY),
                serialize_watermark(last),
            )));
        }
        delta
    }

    pub(crate) fn apply_delta(&mut self, delta: ReceiptDelta) {
        if let Some(last) = delta.last() {
            self.last = Some(last);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::storage::in_memory::InMemoryStorage;

    use super::*;
    use crate::config::WriteOptions;

    async fn open_clock() -> (LogStorage, ReceiptClock) {
        let storage = LogStorage::new(Arc::new(InMemoryStorage::new()));
        let clock = ReceiptClock::open(&storage).await.unwrap();
        (storage, clock)
    }

    #[tokio::test]
    async fn should_start_at_wall_clock_when_store_is_empty() {
        // given
        let (_, clock) = open_clock().await;
        let mut ops = Vec::new();

        // when
        let delta = clock.build_delta(1_000, 1, &mut ops);

        // then
        assert_eq!(delta.stamps(), &[1_000]);
        assert_eq!(ops.len(), 1);
    }

    #[tokio::test]
    async fn should_break_ties_within_the_same_microsecond() {
        // given
        let (_, clock) = open_clock().await;
        let mut ops = Vec::new();

        // when
        let delta = clock.build_delta(1_000, 3, &mut ops);

        // then
        assert_eq!(delta.stamps(), &[1_000, 1_001, 1_002]);
    }

    #[tokio::test]
    async fn should_stay_above_watermark_when_clock_steps_back() {
        // given
        let (_, mut clock) = open_clock().await;
        let mut ops = Vec::new();
        let first = clock.build_delta(5_000, 1, &mut ops);
        clock.apply_delta(first);

        // when
        let delta = clock.build_delta(4_000, 1, &mut ops);

        // then
        assert_eq!(delta.stamps(), &[5_001]);
    }

    #[tokio::test]
    async fn should_not_advance_until_delta_applied() {
        // given
        let (_, clock) = open_clock().await;
        let mut ops = Vec::new();

        // when
        let _ = clock.build_delta(1_000, 2, &mut ops);

        // then
        assert_eq!(clock.last(), None);
    }

    #[tokio::test]
    async fn should_recover_watermark_after_reopen() {
        // given
        let (storage, mut clock) = open_clock().await;
        let mut ops = Vec::new();
        let delta = clock.build_delta(9_000, 2, &mut ops);
        storage.apply(ops, WriteOptions::default()).await.unwrap();
        clock.apply_delta(delta);

        // when
        let reopened = ReceiptClock::open(&storage).await.unwrap();

        // then
        assert_eq!(reopened.last(), Some(9_001));
        let mut ops = Vec::new();
        assert_eq!(reopened.build_delta(100, 1, &mut ops).stamps(), &[9_002]);
    }
}
