//! Order-preserving encoding for variable-length byte strings inside keys.
//!
//! Bytes are escaped and the value is terminated with `0x00`:
//!
//! - `0x00` → `0x01 0x01`
//! - `0x01` → `0x01 0x02`
//! - `0xFF` → `0x01 0x03`
//! - all other bytes unchanged
//!
//! Because the terminator is the smallest byte, a shorter value sorts before
//! any longer value it prefixes, and fields that follow the terminator never
//! bleed into the ordering of the encoded value itself.

use bytes::{BufMut, Bytes, BytesMut};

use super::DeserializeError;

const TERMINATOR: u8 = 0x00;
const ESCAPE: u8 = 0x01;

/// Appends the escaped, terminated form of `value` to `buf`.
pub fn serialize(value: &[u8], buf: &mut BytesMut) {
    buf.reserve(value.len() + 1);
    for &b in value {
        match b {
            0x00 => buf.put_slice(&[ESCAPE, 0x01]),
            0x01 => buf.put_slice(&[ESCAPE, 0x02]),
            0xFF => buf.put_slice(&[ESCAPE, 0x03]),
            other => buf.put_u8(other),
        }
    }
    buf.put_u8(TERMINATOR);
}

/// Decodes one terminated value from the front of `buf`, advancing it past
/// the terminator.
pub fn deserialize(buf: &mut &[u8]) -> Result<Bytes, DeserializeError> {
    let mut out = BytesMut::new();
    let mut i = 0;
    while i < buf.len() {
        match buf[i] {
            TERMINATOR => {
                *buf = &buf[i + 1..];
                return Ok(out.freeze());
            }
            ESCAPE => {
                let decoded = match buf.get(i + 1) {
                    Some(0x01) => 0x00,
                    Some(0x02) => 0x01,
                    Some(0x03) => 0xFF,
                    Some(other) => {
                        return Err(DeserializeError::new(format!(
                            "invalid escape sequence 0x01 0x{:02x}",
                            other
                        )));
                    }
                    None => return Err(DeserializeError::new("truncated escape sequence")),
                };
                out.put_u8(decoded);
                i += 2;
            }
            other => {
                out.put_u8(other);
                i += 1;
            }
        }
    }
    Err(DeserializeError::new("missing terminator"))
}
