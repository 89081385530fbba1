//! Tag-dispatch decoding of the field-tagged binary value encoding.
//!
//! The cache stores each document as a protobuf-style message with no
//! published schema. The tag numbers below were reconstructed empirically
//! from observed byte patterns: a string value always arrives behind the
//! two-byte tag `0x8a 0x01`, a double behind `0x19`, a boolean behind
//! `0x08`, and so on. Reading the tag as a varint collapses the one- and
//! two-byte cases into a single `(field, wire type)` dispatch:
//!
//! | field | wire     | meaning                               |
//! |-------|----------|---------------------------------------|
//! | 1     | varint   | boolean (`0x08`)                      |
//! | 2     | varint   | integer (`0x10`)                      |
//! | 3     | fixed64  | double, LE IEEE-754 (`0x19`)          |
//! | 5     | length   | reference path (`0x2a`)               |
//! | 6     | length   | map: nested name/value entries (`0x32`)|
//! | 8     | length   | geopoint: lat + lon doubles (`0x42`)  |
//! | 9     | length   | array: repeated value blocks (`0x4a`) |
//! | 10    | length   | timestamp: seconds + nanos (`0x52`)   |
//! | 11    | varint   | null (`0x58`)                         |
//! | 17    | length   | UTF-8 string (`0x8a 0x01`)            |
//! | 18    | length   | raw bytes (`0x92 0x01`)               |
//!
//! Anything unrecognized degrades to [`FirestoreValue::Bytes`] rather than
//! failing: the store makes no internal-consistency promises after a torn
//! write, so decoding one field must never abort the containing document.

use codec::Cursor;
use thiserror::Error;
use tracing::debug;

use crate::value::{FieldMap, FirestoreValue};

const FIELD_BOOLEAN: u64 = 1;
const FIELD_INTEGER: u64 = 2;
const FIELD_DOUBLE: u64 = 3;
const FIELD_REFERENCE: u64 = 5;
const FIELD_MAP: u64 = 6;
const FIELD_GEO_POINT: u64 = 8;
const FIELD_ARRAY: u64 = 9;
const FIELD_TIMESTAMP: u64 = 10;
const FIELD_NULL: u64 = 11;
const FIELD_STRING: u64 = 17;
const FIELD_BYTES: u64 = 18;

const WIRE_VARINT: u64 = 0;
const WIRE_FIXED64: u64 = 1;
const WIRE_LENGTH: u64 = 2;
const WIRE_FIXED32: u64 = 5;

/// Document-message field holding one name/value entry.
const DOC_FIELD_ENTRY: u64 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error(transparent)]
    Codec(#[from] codec::CodecError),
    /// Structure inside a value message contradicted its own framing.
    #[error("malformed value message")]
    Malformed,
}

/// Decodes one value byte-string, consuming exactly the value's bytes.
///
/// # Errors
///
/// Fails only when the payload is physically truncated mid-structure
/// (e.g. a double tag followed by 3 bytes instead of 8). An *unrecognized*
/// tag is not an error — the value degrades to `Bytes`.
pub fn decode_value(bytes: &[u8]) -> Result<FirestoreValue, DecodeError> {
    if bytes.is_empty() {
        return Ok(FirestoreValue::Null);
    }
    let mut cur = Cursor::new(bytes);
    let tag = cur.read_varint()?;
    let (field, wire) = (tag >> 3, tag & 7);

    let value = match (field, wire) {
        (FIELD_BOOLEAN, WIRE_VARINT) => FirestoreValue::Boolean(cur.read_varint()? != 0),
        (FIELD_INTEGER, WIRE_VARINT) => FirestoreValue::Integer(cur.read_varint()? as i64),
        (FIELD_DOUBLE, WIRE_FIXED64) => FirestoreValue::Double(cur.read_double_le()?),
        (FIELD_NULL, WIRE_VARINT) => {
            cur.read_varint()?;
            FirestoreValue::Null
        }
        (FIELD_REFERENCE, WIRE_LENGTH) => {
            let raw = cur.read_length_delimited()?;
            match std::str::from_utf8(raw) {
                Ok(path) => FirestoreValue::Reference(path.to_string()),
                Err(_) => FirestoreValue::Bytes(raw.to_vec()),
            }
        }
        (FIELD_STRING, WIRE_LENGTH) => {
            let raw = cur.read_length_delimited()?;
            match decode_printable_string(raw) {
                Some(s) => FirestoreValue::String(s),
                // Accepted only if printable; otherwise preserve the bytes.
                None => FirestoreValue::Bytes(raw.to_vec()),
            }
        }
        (FIELD_BYTES, WIRE_LENGTH) => FirestoreValue::Bytes(cur.read_length_delimited()?.to_vec()),
        (FIELD_MAP, WIRE_LENGTH) => FirestoreValue::Map(decode_map(cur.read_length_delimited()?)?),
        (FIELD_ARRAY, WIRE_LENGTH) => {
            FirestoreValue::Array(decode_array(cur.read_length_delimited()?)?)
        }
        (FIELD_TIMESTAMP, WIRE_LENGTH) => decode_timestamp(cur.read_length_delimited()?)?,
        (FIELD_GEO_POINT, WIRE_LENGTH) => decode_geo_point(cur.read_length_delimited()?)?,
        // Unrecognized tag: degrade to bytes, never a hard failure.
        _ => return Ok(FirestoreValue::Bytes(bytes.to_vec())),
    };
    Ok(value)
}

/// UTF-8 decode plus the printable heuristic: control characters mean the
/// bytes only *look* like a string tag.
fn decode_printable_string(raw: &[u8]) -> Option<String> {
    let s = std::str::from_utf8(raw).ok()?;
    if s.chars().any(|c| c.is_control()) {
        return None;
    }
    Some(s.to_string())
}

/// Map payload: repeated entries, each `(name, value)`.
fn decode_map(bytes: &[u8]) -> Result<FieldMap, DecodeError> {
    let mut map = FieldMap::new();
    let mut cur = Cursor::new(bytes);
    while !cur.is_empty() {
        let tag = cur.read_varint()?;
        if tag >> 3 != 1 || tag & 7 != WIRE_LENGTH {
            skip_wire(&mut cur, tag & 7)?;
            continue;
        }
        let entry = cur.read_length_delimited()?;
        if let Some((name, value)) = decode_field_entry(entry) {
            map.insert(name, value);
        }
    }
    Ok(map)
}

/// Array payload: repeated sibling value blocks.
fn decode_array(bytes: &[u8]) -> Result<Vec<FirestoreValue>, DecodeError> {
    let mut items = Vec::new();
    let mut cur = Cursor::new(bytes);
    while !cur.is_empty() {
        let tag = cur.read_varint()?;
        if tag >> 3 != 1 || tag & 7 != WIRE_LENGTH {
            skip_wire(&mut cur, tag & 7)?;
            continue;
        }
        let value_bytes = cur.read_length_delimited()?;
        match decode_value(value_bytes) {
            Ok(v) => items.push(v),
            // A malformed element degrades to null, preserving positions.
            Err(_) => items.push(FirestoreValue::Null),
        }
    }
    Ok(items)
}

/// Timestamp payload: varint seconds (field 1) + varint nanos (field 2).
fn decode_timestamp(bytes: &[u8]) -> Result<FirestoreValue, DecodeError> {
    let mut seconds: i64 = 0;
    let mut nanos: i32 = 0;
    let mut cur = Cursor::new(bytes);
    while !cur.is_empty() {
        let tag = cur.read_varint()?;
        match (tag >> 3, tag & 7) {
            (1, WIRE_VARINT) => seconds = cur.read_varint()? as i64,
            (2, WIRE_VARINT) => nanos = cur.read_varint()? as i32,
            (_, wire) => skip_wire(&mut cur, wire)?,
        }
    }
    Ok(FirestoreValue::Timestamp { seconds, nanos })
}

/// GeoPoint payload: two little-endian doubles (lat field 1, lon field 2).
fn decode_geo_point(bytes: &[u8]) -> Result<FirestoreValue, DecodeError> {
    let mut lat = 0.0;
    let mut lon = 0.0;
    let mut cur = Cursor::new(bytes);
    while !cur.is_empty() {
        let tag = cur.read_varint()?;
        match (tag >> 3, tag & 7) {
            (1, WIRE_FIXED64) => lat = cur.read_double_le()?,
            (2, WIRE_FIXED64) => lon = cur.read_double_le()?,
            (_, wire) => skip_wire(&mut cur, wire)?,
        }
    }
    Ok(FirestoreValue::GeoPoint { lat, lon })
}

/// One name/value entry: field 1 = name bytes, field 2 = value bytes.
fn decode_field_entry(entry: &[u8]) -> Option<(String, FirestoreValue)> {
    let mut name: Option<String> = None;
    let mut value: Option<FirestoreValue> = None;
    let mut cur = Cursor::new(entry);
    while !cur.is_empty() {
        let tag = cur.read_varint().ok()?;
        match (tag >> 3, tag & 7) {
            (1, WIRE_LENGTH) => {
                let raw = cur.read_length_delimited().ok()?;
                name = Some(std::str::from_utf8(raw).ok()?.to_string());
            }
            (2, WIRE_LENGTH) => {
                let raw = cur.read_length_delimited().ok()?;
                match decode_value(raw) {
                    Ok(v) => value = Some(v),
                    Err(e) => {
                        // Malformed sub-region: omit the field, keep the
                        // rest of the record.
                        debug!(error = %e, "omitting field with malformed value");
                        return None;
                    }
                }
            }
            (_, wire) => skip_wire(&mut cur, wire).ok()?,
        }
    }
    Some((name?, value?))
}

/// Assembles a document's field mapping from the value payload's
/// consecutive field entries. Never fails: malformed entries are omitted
/// and unknown message fields skipped by wire type, so one bad field never
/// costs the whole document.
#[must_use]
pub fn decode_document_fields(payload: &[u8]) -> FieldMap {
    let mut fields = FieldMap::new();
    let mut cur = Cursor::new(payload);
    while !cur.is_empty() {
        let Ok(tag) = cur.read_varint() else { break };
        let (field, wire) = (tag >> 3, tag & 7);
        if field == DOC_FIELD_ENTRY && wire == WIRE_LENGTH {
            match cur.read_length_delimited() {
                Ok(entry) => {
                    if let Some((name, value)) = decode_field_entry(entry) {
                        fields.insert(name, value);
                    }
                }
                Err(_) => break,
            }
        } else if skip_wire(&mut cur, wire).is_err() {
            break;
        }
    }
    fields
}

fn skip_wire(cur: &mut Cursor<'_>, wire: u64) -> Result<(), DecodeError> {
    match wire {
        WIRE_VARINT => {
            cur.read_varint()?;
        }
        WIRE_FIXED64 => cur.skip(8)?,
        WIRE_LENGTH => {
            cur.read_length_delimited()?;
        }
        WIRE_FIXED32 => cur.skip(4)?,
        _ => return Err(DecodeError::Malformed),
    }
    Ok(())
}
