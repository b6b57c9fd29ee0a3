//! Export engine.
//!
//! Produces a logset's entire history as one artifact, encoded as a JSON
//! array or as CSV. History is read newest first in pages of
//! [`EXPORT_PAGE_SIZE`] records. Each page's `before` cursor is the receipt
//! time of the previous page's last record, and the walk ends at the first
//! short page. Pages are encoded and handed out as they are read, so memory
//! use is bounded by one page regardless of history size.
//!
//! CSV needs its column set before the first row, so it runs two passes.
//! The first pass only collects column names. The second pass re-reads the
//! same history, pinned below the newest record seen by the first, and emits
//! rows. Records appended while an export runs are never emitted without
//! their columns.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use futures::Stream;
use futures::stream::try_unfold;
use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::model::{LogRecord, OwnerId, format_timestamp};
use crate::query::ensure_logset;
use crate::reader::{LogRead, RangeQuery};

/// Page size used to walk history during an export.
pub const EXPORT_PAGE_SIZE: usize = 1000;

/// Output encoding of an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = std::convert::Infallible;

    /// Anything other than `csv` selects JSON.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("csv") {
            Ok(ExportFormat::Csv)
        } else {
            Ok(ExportFormat::Json)
        }
    }
}

/// A record's JSON view: `{"recv_time": ..., "data": ...}`.
///
/// `data` embeds the payload verbatim when it is valid JSON and falls back
/// to a JSON string of its text otherwise.
#[derive(Debug, Serialize)]
pub struct RecordView<'a> {
    pub recv_time: String,
    pub data: DataView<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DataView<'a> {
    Json(&'a RawValue),
    Text(Cow<'a, str>),
}

impl<'a> DataView<'a> {
    pub fn from_payload(payload: &'a [u8]) -> Self {
        match serde_json::from_slice::<&RawValue>(payload) {
            Ok(raw) => DataView::Json(raw),
            Err(_) => DataView::Text(String::from_utf8_lossy(payload)),
        }
    }
}

impl<'a> From<&'a LogRecord> for RecordView<'a> {
    fn from(record: &'a LogRecord) -> Self {
        Self {
            recv_time: format_timestamp(&record.received_at),
            data: DataView::from_payload(&record.payload),
        }
    }
}

/// Walks a partition's history page by page, newest first.
pub struct PageCursor {
    reader: Arc<dyn LogRead>,
    owner: OwnerId,
    logset: String,
    page_size: usize,
    before: Option<DateTime<Utc>>,
    exhausted: bool,
}

impl PageCursor {
    pub fn new(reader: Arc<dyn LogRead>, owner: OwnerId, logset: String, page_size: usize) -> Self {
        Self {
            reader,
            owner,
            logset,
            page_size,
            before: None,
            exhausted: false,
        }
    }

    /// Restricts the walk to records received strictly before `before`.
    pub fn starting_before(mut self, before: DateTime<Utc>) -> Self {
        self.before = Some(before);
        self
    }

    /// Returns the next non-empty page, or `None` once history is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<LogRecord>>> {
        if self.exhausted {
            return Ok(None);
        }
        let query = RangeQuery::new(self.page_size, self.before, None)?;
        let page = self
            .reader
            .range_query(&self.owner, &self.logset, &query)
            .await?;
        if page.len() < self.page_size {
            self.exhausted = true;
        }
        match page.last() {
            Some(last) => {
                self.before = Some(last.received_at);
                Ok(Some(page))
            }
            None => Ok(None),
        }
    }
}

/// A piece of an export body and the number of records it encodes.
#[derive(Debug, Clone)]
pub struct ExportChunk {
    pub data: Bytes,
    pub records: usize,
}

impl ExportChunk {
    fn framing(data: &'static [u8]) -> Self {
        Self {
            data: Bytes::from_static(data),
            records: 0,
        }
    }
}

pub type ExportStream = Pin<Box<dyn Stream<Item = Result<ExportChunk>> + Send>>;

/// Starts an export of one of `owner`'s logsets.
///
/// Fails with [`Error::NotFound`] before producing any output when the
/// logset does not exist. Errors after that point are yielded by the stream.
pub async fn export_logset(
    reader: Arc<dyn LogRead>,
    owner: OwnerId,
    logset: String,
    format: ExportFormat,
) -> Result<ExportStream> {
    export_with_page_size(reader, owner, logset, format, EXPORT_PAGE_SIZE).await
}

/// Streams an export of a logset the caller has already resolved.
///
/// Skips the existence check of [`export_logset`]; an unknown logset
/// exports as empty.
pub fn export_stream(
    reader: Arc<dyn LogRead>,
    owner: OwnerId,
    logset: String,
    format: ExportFormat,
) -> ExportStream {
    stream_with_page_size(reader, owner, logset, format, EXPORT_PAGE_SIZE)
}

pub(crate) async fn export_with_page_size(
    reader: Arc<dyn LogRead>,
    owner: OwnerId,
    logset: String,
    format: ExportFormat,
    page_size: usize,
) -> Result<ExportStream> {
    ensure_logset(reader.as_ref(), &owner, &logset).await?;
    Ok(stream_with_page_size(
        reader, owner, logset, format, page_size,
    ))
}

fn stream_with_page_size(
    reader: Arc<dyn LogRead>,
    owner: OwnerId,
    logset: String,
    format: ExportFormat,
    page_size: usize,
) -> ExportStream {
    let cursor = PageCursor::new(reader, owner, logset, page_size);
    match format {
        ExportFormat::Json => json_stream(cursor),
        ExportFormat::Csv => csv_stream(cursor),
    }
}

enum JsonStage {
    Open,
    Pages,
    Done,
}

struct JsonState {
    cursor: PageCursor,
    stage: JsonStage,
    first: bool,
}

fn json_stream(cursor: PageCursor) -> ExportStream {
    let state = JsonState {
        cursor,
        stage: JsonStage::Open,
        first: true,
    };
    Box::pin(try_unfold(state, |mut state| async move {
        match state.stage {
            JsonStage::Open => {
                state.stage = JsonStage::Pages;
                Ok(Some((ExportChunk::framing(b"["), state)))
            }
            JsonStage::Pages => match state.cursor.next_page().await? {
                Some(page) => {
                    let chunk = encode_json_page(&page, &mut state.first)?;
                    Ok(Some((chunk, state)))
                }
                None => {
                    state.stage = JsonStage::Done;
                    Ok(Some((ExportChunk::framing(b"]"), state)))
                }
            },
            JsonStage::Done => Ok(None),
        }
    }))
}

fn encode_json_page(page: &[LogRecord], first: &mut bool) -> Result<ExportChunk> {
    let mut buf = Vec::with_capacity(page.iter().map(|r| r.payload.len() + 48).sum());
    for record in page {
        if !*first {
            buf.push(b',');
        }
        *first = false;
        serde_json::to_writer(&mut buf, &RecordView::from(record))
            .map_err(|e| Error::Encoding(format!("failed to encode record: {}", e)))?;
    }
    Ok(ExportChunk {
        data: Bytes::from(buf),
        records: page.len(),
    })
}

/// Sorted union of the top-level keys seen across payloads.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    columns: BTreeSet<String>,
}

impl ColumnSet {
    pub fn observe(&mut self, payload: &[u8]) {
        match serde_json::from_slice::<Value>(payload) {
            Ok(Value::Object(map)) => self.columns.extend(map.into_iter().map(|(k, _)| k)),
            _ => {
                self.columns.insert(DATA_COLUMN.to_string());
            }
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.columns.iter()
    }
}

const TIME_COLUMN: &str = "time";
const DATA_COLUMN: &str = "data";

/// Top-level fields of a payload. Anything but a JSON object becomes a
/// single `data` field holding the payload text.
fn payload_fields(payload: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(payload) {
        Ok(Value::Object(map)) => map,
        _ => {
            let mut map = Map::new();
            map.insert(
                DATA_COLUMN.to_string(),
                Value::String(String::from_utf8_lossy(payload).into_owned()),
            );
            map
        }
    }
}

fn cell(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed("null"),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        nested => Cow::Owned(nested.to_string()),
    }
}

enum CsvStage {
    Discover(PageCursor),
    Rows(PageCursor, Vec<String>),
    Done,
}

fn csv_stream(cursor: PageCursor) -> ExportStream {
    Box::pin(try_unfold(CsvStage::Discover(cursor), |stage| async move {
        match stage {
            CsvStage::Discover(mut cursor) => {
                let (columns, newest) = discover_columns(&mut cursor).await?;
                let columns: Vec<String> = columns.columns().cloned().collect();
                let header = encode_csv_header(&columns)?;
                let next = match newest {
                    Some(newest) => {
                        let rows = PageCursor::new(
                            cursor.reader,
                            cursor.owner,
                            cursor.logset,
                            cursor.page_size,
                        )
                        .starting_before(newest + Duration::microseconds(1));
                        CsvStage::Rows(rows, columns)
                    }
                    None => CsvStage::Done,
                };
                Ok(Some((header, next)))
            }
            CsvStage::Rows(mut cursor, columns) => match cursor.next_page().await? {
                Some(page) => {
                    let chunk = encode_csv_page(&page, &columns)?;
                    Ok(Some((chunk, CsvStage::Rows(cursor, columns))))
                }
                None => Ok(None),
            },
            CsvStage::Done => Ok(None),
        }
    }))
}

/// First pass: collects the column set and the newest receipt time.
async fn discover_columns(
    cursor: &mut PageCursor,
) -> Result<(ColumnSet, Option<DateTime<Utc>>)> {
    let mut columns = ColumnSet::default();
    let mut newest = None;
    while let Some(page) = cursor.next_page().await? {
        if newest.is_none() {
            newest = page.first().map(|r| r.received_at);
        }
        for record in &page {
            columns.observe(&record.payload);
        }
    }
    Ok((columns, newest))
}

fn csv_error(e: impl std::fmt::Display) -> Error {
    Error::Encoding(format!("failed to write csv: {}", e))
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<Bytes> {
    writer
        .into_inner()
        .map(Bytes::from)
        .map_err(|e| csv_error(e.error()))
}

fn encode_csv_header(columns: &[String]) -> Result<ExportChunk> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let header = std::iter::once(TIME_COLUMN).chain(columns.iter().map(String::as_str));
    writer.write_record(header).map_err(csv_error)?;
    Ok(ExportChunk {
        data: finish_csv(writer)?,
        records: 0,
    })
}

fn encode_csv_page(page: &[LogRecord], columns: &[String]) -> Result<ExportChunk> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in page {
        let fields = payload_fields(&record.payload);
        let mut row: Vec<Cow<'_, str>> = Vec::with_capacity(columns.len() + 1);
        row.push(Cow::Owned(format_timestamp(&record.received_at)));
        for column in columns {
            row.push(fields.get(column).map(cell).unwrap_or(Cow::Borrowed("")));
        }
        writer
            .write_record(row.iter().map(|c| c.as_bytes()))
            .map_err(csv_error)?;
    }
    Ok(ExportChunk {
        data: finish_csv(writer)?,
        records: page.len(),
    })
}
