//! Ingestion endpoints.
//!
//! Two transports share one code path. `POST /api/v1/ingest` takes a single
//! envelope per request. `GET /api/v1/ingest` upgrades to a WebSocket that
//! accepts one envelope per message and answers each with its own reply,
//! using the frame type of the message it answers. A bad message gets an
//! error reply and the connection stays open; only transport failures end
//! it. An oversized message is answered with an error like any other bad
//! message. Frames beyond [`STREAM_FRAME_CEILING`] times the limit are
//! refused by the transport itself, which closes the connection.

use axum::Json;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::rejection::BytesRejection;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::Response;
use bytes::Bytes;
use serde_json::Value;

use super::error::ApiError;
use super::handlers::AppState;
use super::metrics::Transport;
use super::request::Envelope;
use super::response::{error_body, ok_status};
use crate::error::{Error, Result};
use crate::model::{LogRecord, OwnerId};

/// Multiple of the message limit at which the stream transport gives up on
/// a frame instead of replying to it.
pub const STREAM_FRAME_CEILING: usize = 4;

fn too_large(limit: usize) -> Error {
    Error::TooLarge(format!("message exceeds {} bytes", limit))
}

/// Parses one envelope and appends it for `owner`.
async fn ingest_message(
    state: &AppState,
    owner: &OwnerId,
    body: &[u8],
    transport: Transport,
) -> Result<LogRecord> {
    let result = async {
        if body.len() > state.max_message_bytes {
            return Err(too_large(state.max_message_bytes));
        }
        let envelope = Envelope::parse(body)?;
        state
            .log
            .append(owner, &envelope.log_set, envelope.payload())
            .await
    }
    .await;
    match &result {
        Ok(_) => state.metrics.record_ingested(transport),
        Err(_) => state.metrics.record_ingest_error(transport),
    }
    result
}

/// Handle POST /api/v1/ingest
pub async fn handle_ingest(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<Json<Value>, ApiError> {
    let body = body.map_err(|rejection| {
        state.metrics.record_ingest_error(Transport::Post);
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large(state.max_message_bytes)
        } else {
            Error::InvalidInput(format!("failed to read body: {}", rejection.body_text()))
        }
    })?;
    ingest_message(&state, &owner, &body, Transport::Post).await?;
    Ok(Json(ok_status()))
}

/// Handle GET /api/v1/ingest (WebSocket upgrade)
///
/// The caller is already authenticated when this runs; the upgrade is only
/// accepted for a valid token.
pub async fn handle_ingest_stream(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.max_message_size(state.max_message_bytes.saturating_mul(STREAM_FRAME_CEILING))
        .on_upgrade(move |socket| stream_session(socket, state, owner))
}

async fn stream_session(mut socket: WebSocket, state: AppState, owner: OwnerId) {
    state.metrics.stream_connections.inc();
    tracing::info!("Stream opened for owner {}", owner);

    while let Some(message) = socket.recv().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Stream for owner {} failed: {}", owner, e);
                break;
            }
        };
        let (body, binary) = match message {
            Message::Text(text) => (Bytes::copy_from_slice(text.as_str().as_bytes()), false),
            Message::Binary(data) => (data, true),
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => break,
        };

        let reply = match ingest_message(&state, &owner, &body, Transport::Stream).await {
            Ok(_) => ok_status(),
            Err(e) => error_body(&ApiError(e).message()),
        };
        let reply = reply.to_string();
        let reply = if binary {
            Message::Binary(Bytes::from(reply))
        } else {
            Message::Text(reply.into())
        };
        if let Err(e) = socket.send(reply).await {
            tracing::warn!("Failed to reply on stream for owner {}: {}", owner, e);
            break;
        }
    }

    state.metrics.stream_connections.dec();
    tracing::info!("Stream closed for owner {}", owner);
}
