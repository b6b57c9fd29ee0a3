//! Storage encoding for librelog records.
//!
//! # Key Format
//!
//! All keys start with a version byte and a record tag:
//!
//! ```text
//! | version (u8) | tag (u8) | ... record-specific fields ... |
//! ```
//!
//! The record type lives in the high 4 bits of the tag; the low 4 bits are
//! reserved and zero.
//!
//! # Record Types
//!
//! - `LogRecord` (0x1): `| owner (16) | terminated logset | inverted recv µs (u64 BE) |`
//! - `LogsetMeta` (0x2): `| owner (16) | terminated logset |`
//! - `Credential` (0x3): `| sha256 digest (32) |`
//! - `OwnerCredential` (0x4): `| owner (16) | sha256 digest (32) |`
//! - `ReceiptWatermark` (0x5): singleton, no fields
//!
//! Log records store `u64::MAX - received_at_micros`, so an ascending key
//! scan over one partition yields records newest first. Logset ids use the
//! terminated-bytes encoding from `common`, so one logset's partition can
//! never overlap another whose id it prefixes.

use std::ops::Bound;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use common::BytesRange;
use common::serde::terminated_bytes;
use common::util::prefix_successor;

use crate::error::{Error, Result};
use crate::model::OwnerId;

/// Key format version.
pub const KEY_VERSION: u8 = 0x01;

/// Length of a credential digest (SHA-256).
pub const DIGEST_LEN: usize = 32;

pub type Digest = [u8; DIGEST_LEN];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    LogRecord = 0x01,
    LogsetMeta = 0x02,
    Credential = 0x03,
    OwnerCredential = 0x04,
    ReceiptWatermark = 0x05,
}

impl RecordType {
    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0x01 => Ok(RecordType::LogRecord),
            0x02 => Ok(RecordType::LogsetMeta),
            0x03 => Ok(RecordType::Credential),
            0x04 => Ok(RecordType::OwnerCredential),
            0x05 => Ok(RecordType::ReceiptWatermark),
            _ => Err(Error::Encoding(format!(
                "invalid record type: 0x{:02x}",
                id
            ))),
        }
    }

    pub fn tag(&self) -> u8 {
        self.id() << 4
    }

    fn put_prefix(&self, buf: &mut BytesMut) {
        buf.put_u8(KEY_VERSION);
        buf.put_u8(self.tag());
    }

    fn check_prefix(&self, buf: &mut &[u8]) -> Result<()> {
        if buf.len() < 2 {
            return Err(Error::Encoding("key too short".to_string()));
        }
        if buf[0] != KEY_VERSION {
            return Err(Error::Encoding(format!(
                "unsupported key version: 0x{:02x}",
                buf[0]
            )));
        }
        let actual = RecordType::from_id(buf[1] >> 4)?;
        if actual != *self {
            return Err(Error::Encoding(format!(
                "expected {:?} key, found {:?}",
                self, actual
            )));
        }
        buf.advance(2);
        Ok(())
    }
}

/// Storage key for the receipt clock's high-water mark.
pub const RECEIPT_WATERMARK_KEY: [u8; 2] = [KEY_VERSION, (RecordType::ReceiptWatermark as u8) << 4];

fn invert_micros(micros: i64) -> u64 {
    u64::MAX - micros.max(0) as u64
}

fn uninvert_micros(inverted: u64) -> i64 {
    (u64::MAX - inverted).min(i64::MAX as u64) as i64
}

fn get_owner(buf: &mut &[u8]) -> Result<OwnerId> {
    if buf.len() < 16 {
        return Err(Error::Encoding("truncated owner id".to_string()));
    }
    let owner = OwnerId::from_slice(&buf[..16])?;
    buf.advance(16);
    Ok(owner)
}

fn get_digest(buf: &mut &[u8]) -> Result<Digest> {
    if buf.len() < DIGEST_LEN {
        return Err(Error::Encoding("truncated digest".to_string()));
    }
    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&buf[..DIGEST_LEN]);
    buf.advance(DIGEST_LEN);
    Ok(digest)
}

fn put_str(buf: &mut BytesMut, s: &str) {
    buf.put_u32(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

fn get_str(buf: &mut &[u8]) -> Result<String> {
    if buf.len() < 4 {
        return Err(Error::Encoding("truncated string length".to_string()));
    }
    let len = buf.get_u32() as usize;
    if buf.len() < len {
        return Err(Error::Encoding("truncated string".to_string()));
    }
    let s = std::str::from_utf8(&buf[..len])
        .map_err(|e| Error::Encoding(format!("invalid utf-8: {}", e)))?
        .to_string();
    buf.advance(len);
    Ok(s)
}

fn get_i64(buf: &mut &[u8]) -> Result<i64> {
    if buf.len() < 8 {
        return Err(Error::Encoding("truncated i64".to_string()));
    }
    Ok(buf.get_i64())
}

fn expect_end(buf: &[u8]) -> Result<()> {
    if buf.is_empty() {
        Ok(())
    } else {
        Err(Error::Encoding(format!("{} trailing bytes", buf.len())))
    }
}

/// Key of a stored log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecordKey {
    pub owner: OwnerId,
    pub logset: Bytes,
    pub received_micros: i64,
}

impl LogRecordKey {
    pub fn new(owner: OwnerId, logset: Bytes, received_micros: i64) -> Self {
        Self {
            owner,
            logset,
            received_micros,
        }
    }

    /// Prefix shared by every record of one (owner, logset) partition.
    pub fn partition_prefix(owner: &OwnerId, logset: &[u8]) -> Bytes {
        let mut buf = BytesMut::with_capacity(2 + 16 + logset.len() + 1);
        RecordType::LogRecord.put_prefix(&mut buf);
        buf.put_slice(owner.as_bytes());
        terminated_bytes::serialize(logset, &mut buf);
        buf.freeze()
    }

    fn key_at(prefix: &Bytes, micros: i64) -> Bytes {
        let mut buf = BytesMut::with_capacity(prefix.len() + 8);
        buf.put_slice(prefix);
        buf.put_u64(invert_micros(micros));
        buf.freeze()
    }

    pub fn serialize(&self) -> Bytes {
        let prefix = Self::partition_prefix(&self.owner, &self.logset);
        Self::key_at(&prefix, self.received_micros)
    }

    pub fn deserialize(key: &[u8]) -> Result<Self> {
        let mut buf = key;
        RecordType::LogRecord.check_prefix(&mut buf)?;
        let owner = get_owner(&mut buf)?;
        let logset = terminated_bytes::deserialize(&mut buf)?;
        if buf.len() != 8 {
            return Err(Error::Encoding("invalid log record key length".to_string()));
        }
        let received_micros = uninvert_micros(buf.get_u64());
        Ok(Self {
            owner,
            logset,
            received_micros,
        })
    }

    /// Scan range over one partition for `after < received_at < before`.
    ///
    /// Bounds are microsecond instants and both are exclusive. Because keys
    /// are stored inverted, `before` becomes the lower key bound and `after`
    /// the upper one.
    pub fn scan_range(
        owner: &OwnerId,
        logset: &[u8],
        before_micros: Option<i64>,
        after_micros: Option<i64>,
    ) -> BytesRange {
        let prefix = Self::partition_prefix(owner, logset);
        let start = match before_micros {
            Some(before) => Bound::Excluded(Self::key_at(&prefix, before)),
            None => Bound::Included(prefix.clone()),
        };
        let end = match after_micros {
            Some(after) => Bound::Excluded(Self::key_at(&prefix, after)),
            None => match prefix_successor(&prefix) {
                Some(succ) => Bound::Excluded(succ),
                None => Bound::Unbounded,
            },
        };
        BytesRange::new(start, end)
    }
}

/// Key of a logset's metadata record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogsetMetaKey {
    pub owner: OwnerId,
    pub logset: Bytes,
}

impl LogsetMetaKey {
    pub fn new(owner: OwnerId, logset: Bytes) -> Self {
        Self { owner, logset }
    }

    fn owner_prefix(owner: &OwnerId) -> Bytes {
        let mut buf = BytesMut::with_capacity(18);
        RecordType::LogsetMeta.put_prefix(&mut buf);
        buf.put_slice(owner.as_bytes());
        buf.freeze()
    }

    pub fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(18 + self.logset.len() + 1);
        RecordType::LogsetMeta.put_prefix(&mut buf);
        buf.put_slice(self.owner.as_bytes());
        terminated_bytes::serialize(&self.logset, &mut buf);
        buf.freeze()
    }

    pub fn deserialize(key: &[u8]) -> Result<Self> {
        let mut buf = key;
        RecordType::LogsetMeta.check_prefix(&mut buf)?;
        let owner = get_owner(&mut buf)?;
        let logset = terminated_bytes::deserialize(&mut buf)?;
        expect_end(buf)?;
        Ok(Self { owner, logset })
    }

    /// All logsets of one owner, ordered by id.
    pub fn scan_owner(owner: &OwnerId) -> BytesRange {
        BytesRange::prefix(Self::owner_prefix(owner))
    }
}

/// Value of a logset's metadata record.
///
/// ```text
/// | name (u32 len + utf8) | description (u32 len + utf8) | created µs (i64 BE) |
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogsetMetaValue {
    pub name: String,
    pub description: String,
    pub created_micros: i64,
}

impl LogsetMetaValue {
    pub fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(16 + self.name.len() + self.description.len());
        put_str(&mut buf, &self.name);
        put_str(&mut buf, &self.description);
        buf.put_i64(self.created_micros);
        buf.freeze()
    }

    pub fn deserialize(value: &[u8]) -> Result<Self> {
        let mut buf = value;
        let name = get_str(&mut buf)?;
        let description = get_str(&mut buf)?;
        let created_micros = get_i64(&mut buf)?;
        expect_end(buf)?;
        Ok(Self {
            name,
            description,
            created_micros,
        })
    }
}

/// Primary credential key: digest → owner lookup used by authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialKey {
    pub digest: Digest,
}

impl CredentialKey {
    pub fn new(digest: Digest) -> Self {
        Self { digest }
    }

    pub fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(2 + DIGEST_LEN);
        RecordType::Credential.put_prefix(&mut buf);
        buf.put_slice(&self.digest);
        buf.freeze()
    }
}

/// Owner-scoped credential index, used to list and revoke an owner's tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerCredentialKey {
    pub owner: OwnerId,
    pub digest: Digest,
}

impl OwnerCredentialKey {
    pub fn new(owner: OwnerId, digest: Digest) -> Self {
        Self { owner, digest }
    }

    pub fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(2 + 16 + DIGEST_LEN);
        RecordType::OwnerCredential.put_prefix(&mut buf);
        buf.put_slice(self.owner.as_bytes());
        buf.put_slice(&self.digest);
        buf.freeze()
    }

    pub fn deserialize(key: &[u8]) -> Result<Self> {
        let mut buf = key;
        RecordType::OwnerCredential.check_prefix(&mut buf)?;
        let owner = get_owner(&mut buf)?;
        let digest = get_digest(&mut buf)?;
        expect_end(buf)?;
        Ok(Self { owner, digest })
    }

    pub fn scan_owner(owner: &OwnerId) -> BytesRange {
        let mut buf = BytesMut::with_capacity(18);
        RecordType::OwnerCredential.put_prefix(&mut buf);
        buf.put_slice(owner.as_bytes());
        BytesRange::prefix(buf.freeze())
    }
}

/// Value stored under both credential keys.
///
/// ```text
/// | owner (16) | name (u32 len + utf8) | prefix (u32 len + utf8) | created µs (i64 BE) |
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialValue {
    pub owner: OwnerId,
    pub name: String,
    pub prefix: String,
    pub created_micros: i64,
}

impl CredentialValue {
    pub fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(32 + self.name.len() + self.prefix.len());
        buf.put_slice(self.owner.as_bytes());
        put_str(&mut buf, &self.name);
        put_str(&mut buf, &self.prefix);
        buf.put_i64(self.created_micros);
        buf.freeze()
    }

    pub fn deserialize(value: &[u8]) -> Result<Self> {
        let mut buf = value;
        let owner = get_owner(&mut buf)?;
        let name = get_str(&mut buf)?;
        let prefix = get_str(&mut buf)?;
        let created_micros = get_i64(&mut buf)?;
        expect_end(buf)?;
        Ok(Self {
            owner,
            name,
            prefix,
            created_micros,
        })
    }
}

/// Encodes the receipt watermark value.
pub fn serialize_watermark(micros: i64) -> Bytes {
    let mut buf = BytesMut::with_capacity(8);
    buf.put_i64(micros);
    buf.freeze()
}

pub fn deserialize_watermark(value: &[u8]) -> Result<i64> {
    let mut buf = value;
    let micros = get_i64(&mut buf)?;
    expect_end(buf)?;
    Ok(micros)
}
