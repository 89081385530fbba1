//! Fixture builders: encode document payloads and write table files the
//! way the cache does.

use sstable::TableWriter;
use std::path::Path;

pub fn put_varint(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push((v as u8 & 0x7f) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

pub fn len_delim(field: u64, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    put_varint(&mut out, (field << 3) | 2);
    put_varint(&mut out, payload.len() as u64);
    out.extend_from_slice(payload);
    out
}

/// String value: field 17, so tag bytes `0x8a 0x01`.
pub fn string_value(s: &str) -> Vec<u8> {
    len_delim(17, s.as_bytes())
}

pub fn double_value(d: f64) -> Vec<u8> {
    let mut out = vec![0x19];
    out.extend_from_slice(&d.to_le_bytes());
    out
}

pub fn bool_value(b: bool) -> Vec<u8> {
    vec![0x08, u8::from(b)]
}

/// A double tag whose payload is cut short, as a torn write leaves it.
pub fn truncated_double_value() -> Vec<u8> {
    vec![0x19, 0x00, 0x00, 0x00, 0x00]
}

pub fn field_entry(name: &str, value_bytes: &[u8]) -> Vec<u8> {
    let mut entry = len_delim(1, name.as_bytes());
    entry.extend_from_slice(&len_delim(2, value_bytes));
    entry
}

/// Document payload: consecutive field entries under field 2.
pub fn document_payload(fields: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in fields {
        out.extend_from_slice(&len_delim(2, &field_entry(name, value)));
    }
    out
}

/// Standard transaction payload used across tests.
pub fn txn_payload(name: &str, amount: f64, date: &str) -> Vec<u8> {
    document_payload(&[
        ("amount", double_value(amount)),
        ("date", string_value(date)),
        ("name", string_value(name)),
    ])
}

/// Writes one `.ldb` table holding the given `(key, seq, payload)` puts.
pub fn write_table(path: &Path, records: &[(&[u8], u64, Vec<u8>)]) {
    let mut w = TableWriter::new();
    for (key, seq, payload) in records {
        w.put(key, *seq, payload);
    }
    w.finish(path).unwrap();
}
