//! Byte-range helpers for storage scans.

use std::ops::{Bound, RangeBounds};

use bytes::{Bytes, BytesMut};

/// A range over storage keys.
///
/// Both ends are explicit [`Bound`]s so callers can express exclusive lower
/// bounds, which `std::ops::Range` cannot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytesRange {
    start: Bound<Bytes>,
    end: Bound<Bytes>,
}

impl BytesRange {
    pub fn new(start: Bound<Bytes>, end: Bound<Bytes>) -> Self {
        Self { start, end }
    }

    /// All keys that start with `prefix`.
    pub fn prefix(prefix: Bytes) -> Self {
        let end = match prefix_successor(&prefix) {
            Some(succ) => Bound::Excluded(succ),
            None => Bound::Unbounded,
        };
        Self {
            start: Bound::Included(prefix),
            end,
        }
    }

    /// Returns true if no key can fall inside this range.
    pub fn is_empty(&self) -> bool {
        match (&self.start, &self.end) {
            (Bound::Included(s), Bound::Included(e)) => s > e,
            (Bound::Included(s), Bound::Excluded(e))
            | (Bound::Excluded(s), Bound::Included(e))
            | (Bound::Excluded(s), Bound::Excluded(e)) => s >= e,
            _ => false,
        }
    }

    /// Returns true if `key` falls inside this range.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        let above_start = match &self.start {
            Bound::Included(s) => key >= s.as_ref(),
            Bound::Excluded(s) => key > s.as_ref(),
            Bound::Unbounded => true,
        };
        let below_end = match &self.end {
            Bound::Included(e) => key <= e.as_ref(),
            Bound::Excluded(e) => key < e.as_ref(),
            Bound::Unbounded => true,
        };
        above_start && below_end
    }
}

impl RangeBounds<Bytes> for BytesRange {
    fn start_bound(&self) -> Bound<&Bytes> {
        self.start.as_ref()
    }

    fn end_bound(&self) -> Bound<&Bytes> {
        self.end.as_ref()
    }
}

/// Smallest key greater than every key with the given prefix, or `None`
/// if the prefix is all `0xFF`.
pub fn prefix_successor(prefix: &[u8]) -> Option<Bytes> {
    let mut buf = BytesMut::from(prefix);
    while let Some(last) = buf.last_mut() {
        if *last < 0xFF {
            *last += 1;
            return Some(buf.freeze());
        }
        buf.truncate(buf.len() - 1);
    }
    None
}
