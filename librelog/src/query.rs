//! Query engine.
//!
//! Turns caller-supplied pagination parameters into one bounded read of a
//! partition. Parameters are validated before the store is touched; the
//! target logset must exist for the caller, otherwise the query fails with
//! [`Error::NotFound`] rather than returning an empty page.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{LogRecord, OwnerId};
use crate::reader::{DEFAULT_LIMIT, LogRead, RangeQuery};

/// Raw pagination parameters as received from a caller.
///
/// All fields are optional text. Empty strings are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    pub limit: Option<String>,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl QueryParams {
    /// Validates and converts the parameters into a [`RangeQuery`].
    pub fn to_range_query(&self) -> Result<RangeQuery> {
        let limit = match non_empty(&self.limit) {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| Error::InvalidInput(format!("invalid limit: {}", raw)))?,
            None => DEFAULT_LIMIT,
        };
        let before = non_empty(&self.before).map(parse_timestamp).transpose()?;
        let after = non_empty(&self.after).map(parse_timestamp).transpose()?;
        RangeQuery::new(limit, before, after)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parses an RFC 3339 timestamp with any offset into UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::InvalidInput(format!("invalid timestamp {}: {}", raw, e)))
}

/// Runs one page query for `owner` against `logset`.
#[tracing::instrument(level = "trace", skip(reader, params))]
pub async fn query_logs<R: LogRead + ?Sized>(
    reader: &R,
    owner: &OwnerId,
    logset: &str,
    params: &QueryParams,
) -> Result<Vec<LogRecord>> {
    let query = params.to_range_query()?;
    ensure_logset(reader, owner, logset).await?;
    reader.range_query(owner, logset, &query).await
}

/// Fails with [`Error::NotFound`] unless the owner has the logset.
pub(crate) async fn ensure_logset<R: LogRead + ?Sized>(
    reader: &R,
    owner: &OwnerId,
    logset: &str,
) -> Result<()> {
    if reader.logset_exists(owner, logset).await? {
        Ok(())
    } else {
        Err(Error::NotFound(format!("logset {} not found", logset)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;

    /// Reader that counts store accesses and returns nothing.
    #[derive(Default)]
    struct CountingReader {
        calls: AtomicUsize,
        exists: bool,
    }

    #[async_trait]
    impl LogRead for CountingReader {
        async fn range_query(
            &self,
            _owner: &OwnerId,
            _logset: &str,
            _query: &RangeQuery,
        ) -> Result<Vec<LogRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn logset_exists(&self, _owner: &OwnerId, _logset: &str) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.exists)
        }
    }

    fn params(limit: Option<&str>, before: Option<&str>, after: Option<&str>) -> QueryParams {
        QueryParams {
            limit: limit.map(String::from),
            before: before.map(String::from),
            after: after.map(String::from),
        }
    }

    #[test]
    fn should_default_limit_to_100() {
        let query = QueryParams::default().to_range_query().unwrap();
        assert_eq!(query.limit(), 100);
        assert_eq!(query.before(), None);
        assert_eq!(query.after(), None);
    }

    #[test]
    fn should_parse_timestamps_with_offsets_into_utc() {
        // given
        let params = params(Some("5"), Some("2024-01-01T02:00:00+02:00"), None);

        // when
        let query = params.to_range_query().unwrap();

        // then
        assert_eq!(
            query.before(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn should_reject_malformed_parameters() {
        for p in [
            params(Some("abc"), None, None),
            params(Some("-1"), None, None),
            params(None, Some("yesterday"), None),
            params(None, None, Some("2024-13-01T00:00:00Z")),
        ] {
            assert!(matches!(p.to_range_query(), Err(Error::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn should_reject_out_of_range_limit_before_store_access() {
        // given
        let reader = CountingReader {
            exists: true,
            ..Default::default()
        };

        // when
        let zero = query_logs(&reader, &OwnerId::generate(), "app", &params(Some("0"), None, None)).await;
        let big = query_logs(&reader, &OwnerId::generate(), "app", &params(Some("1001"), None, None)).await;

        // then
        assert!(matches!(zero, Err(Error::InvalidInput(_))));
        assert!(matches!(big, Err(Error::InvalidInput(_))));
        assert_eq!(reader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_report_missing_logset_as_not_found() {
        // given
        let reader = CountingReader::default();

        // when
        let result = query_logs(&reader, &OwnerId::generate(), "app", &QueryParams::default()).await;

        // then
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn should_return_empty_page_for_empty_logset() {
        let reader = CountingReader {
            exists: true,
            ..Default::default()
        };
        let result = query_logs(&reader, &OwnerId::generate(), "app", &QueryParams::default())
            .await
            .unwrap();
        assert!(result.is_empty());
    }
}
