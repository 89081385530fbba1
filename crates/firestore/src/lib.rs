//! # firestore — document decoding for the offline cache
//!
//! The middle layer of the firesift stack. Given the raw `(key, value)`
//! pairs the `sstable` reader produces, this crate recovers *documents*:
//!
//! - [`decode::decode_value`] interprets one value byte-string as a
//!   recursively typed [`FirestoreValue`] (string, integer, double,
//!   boolean, null, timestamp, geopoint, reference, bytes, map, array),
//!   dispatching on empirically reconstructed tags and degrading anything
//!   unrecognized to `Bytes` instead of failing.
//! - [`decode::decode_document_fields`] assembles a document's field bag
//!   from consecutive field entries, omitting malformed sub-regions so one
//!   torn field never costs the whole record.
//! - [`key::parse_key`] derives collection path, document id, and the
//!   ancestor chain from a raw key, rejecting ambiguous candidates rather
//!   than guessing.
//!
//! No value in this crate touches the filesystem; everything operates on
//! byte slices already in memory.

pub mod decode;
pub mod document;
pub mod key;
pub mod value;

pub use decode::{decode_document_fields, decode_value, DecodeError};
pub use document::Document;
pub use key::{parse_key, KeyError, ParsedKey, DOC_ID_MIN_LEN};
pub use value::{FieldMap, FirestoreValue};
