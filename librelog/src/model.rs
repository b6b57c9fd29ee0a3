//! Core data types.
//!
//! This module defines the records that flow through the write and read
//! paths, the logset metadata they are grouped under, and the bookkeeping
//! attached to issued API tokens.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Identity of the account that owns logsets and tokens.
///
/// Owner ids are opaque to clients; they are produced by the credential
/// gate and never taken from request payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generates a fresh owner identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    pub(crate) fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        Uuid::from_slice(bytes)
            .map(Self)
            .map_err(|e| Error::Encoding(format!("invalid owner id: {}", e)))
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for OwnerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| Error::InvalidInput(format!("invalid owner id: {}", e)))
    }
}

/// A record stored in a logset.
///
/// `received_at` is assigned by the server at acceptance and has
/// microsecond precision. Within one store it is unique, so it doubles as
/// the pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub owner: OwnerId,
    pub logset: String,
    pub received_at: DateTime<Utc>,
    /// Opaque payload, normally the JSON text of the envelope's `data`.
    pub payload: Bytes,
}

/// Metadata describing a logset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Logset {
    pub id: String,
    pub owner: OwnerId,
    pub name: String,
    pub description: String,
}

/// Bookkeeping for an issued token. The token itself is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiKey {
    /// Hex-encoded SHA-256 digest of the token; the handle used to revoke it.
    pub hash: String,
    pub name: String,
    /// First characters of the token, for recognizing it in a list.
    pub prefix: String,
    pub created_at: DateTime<Utc>,
}

/// A freshly issued token. The raw `token` is only ever available here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub owner: OwnerId,
    #[serde(flatten)]
    pub key: ApiKey,
}

/// Converts microseconds since the epoch to a UTC timestamp.
pub(crate) fn datetime_from_micros(micros: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| Error::Encoding(format!("timestamp out of range: {}", micros)))
}

/// Formats a timestamp the way every API response does: RFC 3339, UTC,
/// microsecond precision. The output parses back to the identical instant,
/// which keeps client-side cursors exact.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
