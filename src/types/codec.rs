//! Compact byte encodings used to build expression hash keys.
//!
//! Format:
//! - varint: zig-zag LEB128 of an `i64`
//! - uvarint: LEB128 of a `u64`
//! - compact bytes: `varint(len)` followed by the raw bytes
//! - datum: one flag byte followed by the payload for that kind

use crate::context::StatementContext;

use super::datum::Datum;

pub const NIL_FLAG: u8 = 0;
pub const COMPACT_BYTES_FLAG: u8 = 2;
pub const UINT_FLAG: u8 = 4;
pub const FLOAT_FLAG: u8 = 5;
pub const DECIMAL_FLAG: u8 = 6;
pub const DURATION_FLAG: u8 = 7;
pub const VARINT_FLAG: u8 = 8;
pub const UVARINT_FLAG: u8 = 9;

/// Appends the LEB128 encoding of `v`.
pub fn encode_uvarint(buf: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        buf.push((v as u8) | 0x80);
        v >>= 7;
    }
    buf.push(v as u8);
}

/// Appends the zig-zag LEB128 encoding of `v`.
pub fn encode_varint(buf: &mut Vec<u8>, v: i64) {
    let zigzag = ((v << 1) ^ (v >> 63)) as u64;
    encode_uvarint(buf, zigzag);
}

/// Appends `data` prefixed with its length as a varint.
pub fn encode_compact_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    encode_varint(buf, data.len() as i64);
    buf.extend_from_slice(data);
}

/// Decodes a LEB128 value, returning it with the number of bytes consumed.
#[cfg(test)]
#[must_use]
pub(crate) fn decode_uvarint(buf: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    for (i, byte) in buf.iter().enumerate().take(10) {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

/// Decodes a zig-zag LEB128 value.
#[cfg(test)]
#[must_use]
pub(crate) fn decode_varint(buf: &[u8]) -> Option<(i64, usize)> {
    let (zigzag, n) = decode_uvarint(buf)?;
    let v = ((zigzag >> 1) as i64) ^ -((zigzag & 1) as i64);
    Some((v, n))
}

/// Decodes a compact-bytes value, returning the payload and bytes consumed.
#[cfg(test)]
#[must_use]
pub(crate) fn decode_compact_bytes(buf: &[u8]) -> Option<(&[u8], usize)> {
    let (len, n) = decode_varint(buf)?;
    let len = usize::try_from(len).ok()?;
    let data = buf.get(n..n + len)?;
    Some((data, n + len))
}

/// Appends the flagged encoding of a datum.
///
/// Time values are shifted to UTC using the statement offset.
pub fn encode_datum(buf: &mut Vec<u8>, datum: &Datum, sc: &StatementContext) {
    match datum {
        Datum::Null => buf.push(NIL_FLAG),
        Datum::Int64(v) => {
            buf.push(VARINT_FLAG);
            encode_varint(buf, *v);
        }
        Datum::Uint64(v) => {
            buf.push(UVARINT_FLAG);
            encode_uvarint(buf, *v);
        }
        Datum::Float64(v) => {
            buf.push(FLOAT_FLAG);
            // -0.0 and 0.0 compare equal and must hash equal
            let normalized = if *v == 0.0 { 0.0f64 } else { *v };
            buf.extend_from_slice(&normalized.to_bits().to_be_bytes());
        }
        Datum::String(s) => {
            buf.push(COMPACT_BYTES_FLAG);
            encode_compact_bytes(buf, s.as_bytes());
        }
        Datum::Decimal { value, scale } => {
            buf.push(DECIMAL_FLAG);
            buf.push(*scale as u8);
            buf.extend_from_slice(&value.to_be_bytes());
        }
        Datum::Time(us) => {
            buf.push(UINT_FLAG);
            let utc = us.wrapping_sub(i64::from(sc.time_zone_offset_secs) * 1_000_000);
            buf.extend_from_slice(&(utc as u64).to_be_bytes());
        }
        Datum::Duration(ns) => {
            buf.push(DURATION_FLAG);
            buf.extend_from_slice(&ns.to_be_bytes());
        }
    }
}
