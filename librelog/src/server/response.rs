//! HTTP response types for the librelog server.

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;
use serde_json::{Value, json};

use super::metrics::Metrics;
use crate::export::{ExportFormat, ExportStream, RecordView};
use crate::model::LogRecord;

/// `{"status":"ok"}`, the acknowledgement for an accepted message.
pub fn ok_status() -> Value {
    json!({ "status": "ok" })
}

/// `{"error": <reason>}`.
pub fn error_body(message: &str) -> Value {
    json!({ "error": message })
}

/// A page of records rendered as a JSON array of `{recv_time, data}`.
pub struct LogsResponse(pub Vec<LogRecord>);

impl IntoResponse for LogsResponse {
    fn into_response(self) -> Response {
        let views: Vec<RecordView<'_>> = self.0.iter().map(RecordView::from).collect();
        match serde_json::to_vec(&views) {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Failed to encode query response: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(error_body("internal error")),
                )
                    .into_response()
            }
        }
    }
}

/// A downloadable export, streamed page by page.
///
/// Once headers are sent a failure can no longer change the status, so an
/// error mid-stream is logged and aborts the body.
pub fn export_response(
    name: &str,
    format: ExportFormat,
    stream: ExportStream,
    metrics: Arc<Metrics>,
) -> Response {
    let logset = name.to_string();
    let body = stream
        .map_ok(move |chunk| {
            metrics.records_exported_total.inc_by(chunk.records as u64);
            chunk.data
        })
        .inspect_err(move |e| tracing::error!("Export of {} aborted: {}", logset, e));

    let disposition = format!(
        "attachment; filename=\"{}.{}\"",
        attachment_name(name),
        format.extension()
    );
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(format.content_type())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

/// Makes a logset name safe to place inside a quoted header parameter.
fn attachment_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c == '"' || c == '\\' || c.is_control() || !c.is_ascii() {
                '_'
            } else {
                c
            }
        })
        .collect();
    if cleaned.is_empty() {
        "export".to_string()
    } else {
        cleaned
    }
}
