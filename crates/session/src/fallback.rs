//! Heuristic fallback scanner for files the strict table reader rejects.
//!
//! A cache file with a torn footer or a corrupt index block still holds
//! mostly intact protobuf fragments. This scanner treats the file as a flat
//! byte string and anchors on *field-name markers*: the encoding of a field
//! name is distinctive enough (`0x0a`, length, name bytes) to locate record
//! neighborhoods without any block structure.
//!
//! ```text
//!   ... 0a 06 "amount" .. 19 <8-byte double> .. 0a 04 "date" .. 8a 01 ...
//!       └──── anchor ────┘   └── value search window ──┘
//!   └───────────────── record window around the anchor ─────────────────┘
//! ```
//!
//! Recovered documents flow through the same [`Document`] interface as the
//! strict decoder, but are only admitted for `(collection, id)` pairs the
//! strict path did not produce. The fallback never overrides a successful
//! strict decode.

use firestore::{Document, FieldMap, FirestoreValue, ParsedKey};
use tracing::debug;

/// Bytes scanned around a transaction's `amount` anchor for its sibling
/// fields.
pub const TRANSACTION_RECORD_WINDOW: usize = 1500;
/// Bytes scanned around an account's `current_balance` anchor. Accounts
/// carry more (and longer) fields than transactions.
pub const ACCOUNT_RECORD_WINDOW: usize = 2500;
/// Bytes scanned around a goal-history `contribution` anchor. History rows
/// nest inside goal documents, so the neighborhood is the widest.
pub const GOAL_HISTORY_RECORD_WINDOW: usize = 4000;

/// How far past a field-name marker a string value tag may appear.
pub const STRING_SEARCH_WINDOW: usize = 50;
/// How far past a field-name marker a double or boolean tag may appear.
pub const VALUE_SEARCH_WINDOW: usize = 20;

/// Largest absolute amount accepted as real money, mirroring the strict
/// builders' range gate.
const MAX_ABS_AMOUNT: f64 = 10_000_000.0;

const TAG_STRING: [u8; 2] = [0x8a, 0x01];
const TAG_DOUBLE: u8 = 0x19;
const TAG_BOOLEAN: u8 = 0x08;

/// Scans a whole file's bytes, recovering transactions, accounts, and goal
/// history rows.
///
/// `source` tags the synthesized document ids. It must be unique per
/// scanned file (the file stem works) so that recoveries from different
/// files never share an id and collapse in the caller's merge.
#[must_use]
pub fn scan_bytes(data: &[u8], source: &str) -> Vec<Document> {
    let mut docs = scan_transactions(data, source);
    docs.extend(scan_accounts(data, source));
    docs.extend(scan_goal_history(data, source));
    if !docs.is_empty() {
        debug!(recovered = docs.len(), source, "heuristic scan recovered documents");
    }
    docs
}

fn scan_transactions(data: &[u8], source: &str) -> Vec<Document> {
    let mut docs = Vec::new();
    for (n, anchor) in marker_positions(data, "amount").into_iter().enumerate() {
        let window = record_window(data, anchor, TRANSACTION_RECORD_WINDOW);
        let Some(amount) = double_after_marker(data, anchor, "amount") else {
            continue;
        };
        let Some(date) = string_field(window, "date").filter(|d| is_iso_date(d)) else {
            continue;
        };
        let Some(name) =
            string_field(window, "name").or_else(|| string_field(window, "original_name"))
        else {
            continue;
        };

        let mut fields = FieldMap::new();
        fields.insert("amount", FirestoreValue::Double(amount));
        fields.insert("date", FirestoreValue::String(date));
        fields.insert("name", FirestoreValue::String(name));
        for opt in ["original_name", "account_id", "category_id", "type"] {
            if let Some(v) = string_field(window, opt) {
                fields.insert(opt, FirestoreValue::String(v));
            }
        }
        if let Some(pending) = boolean_field(window, "pending") {
            fields.insert("pending", FirestoreValue::Boolean(pending));
        }
        docs.push(synthesize(
            "transactions",
            &format!("recovered_{source}_txn_{n:04}"),
            fields,
        ));
    }
    docs
}

fn scan_accounts(data: &[u8], source: &str) -> Vec<Document> {
    let mut docs = Vec::new();
    for (n, anchor) in marker_positions(data, "current_balance")
        .into_iter()
        .enumerate()
    {
        let window = record_window(data, anchor, ACCOUNT_RECORD_WINDOW);
        let Some(balance) = double_after_marker(data, anchor, "current_balance") else {
            continue;
        };
        let Some(name) =
            string_field(window, "name").or_else(|| string_field(window, "official_name"))
        else {
            continue;
        };

        let mut fields = FieldMap::new();
        fields.insert("current_balance", FirestoreValue::Double(balance));
        fields.insert("name", FirestoreValue::String(name));
        for opt in ["official_name", "institution_name", "mask", "subtype"] {
            if let Some(v) = string_field(window, opt) {
                fields.insert(opt, FirestoreValue::String(v));
            }
        }
        docs.push(synthesize(
            "accounts",
            &format!("recovered_{source}_acct_{n:04}"),
            fields,
        ));
    }
    docs
}

fn scan_goal_history(data: &[u8], source: &str) -> Vec<Document> {
    let mut docs = Vec::new();
    for (n, anchor) in marker_positions(data, "contribution")
        .into_iter()
        .enumerate()
    {
        let window = record_window(data, anchor, GOAL_HISTORY_RECORD_WINDOW);
        let Some(contribution) = double_after_marker(data, anchor, "contribution") else {
            continue;
        };
        let Some(month) = string_field(window, "month").filter(|m| is_iso_month(m)) else {
            continue;
        };

        let mut fields = FieldMap::new();
        fields.insert("contribution", FirestoreValue::Double(contribution));
        fields.insert("month", FirestoreValue::String(month));
        if let Some(balance) = double_field(window, "balance") {
            fields.insert("balance", FirestoreValue::Double(balance));
        }
        if let Some(goal_id) = string_field(window, "goal_id") {
            fields.insert("goal_id", FirestoreValue::String(goal_id));
        }
        docs.push(synthesize(
            "financial_goal_history",
            &format!("recovered_{source}_hist_{n:04}"),
            fields,
        ));
    }
    docs
}

/// Field-name marker: field 1 of a map entry, length-prefixed name.
fn marker(name: &str) -> Vec<u8> {
    let mut m = Vec::with_capacity(name.len() + 2);
    m.push(0x0a);
    m.push(name.len() as u8);
    m.extend_from_slice(name.as_bytes());
    m
}

/// Every position where `name`'s marker begins.
fn marker_positions(data: &[u8], name: &str) -> Vec<usize> {
    let needle = marker(name);
    let mut positions = Vec::new();
    if needle.len() > data.len() {
        return positions;
    }
    let mut i = 0;
    while i + needle.len() <= data.len() {
        if data[i..i + needle.len()] == needle[..] {
            positions.push(i);
            i += needle.len();
        } else {
            i += 1;
        }
    }
    positions
}

fn record_window(data: &[u8], anchor: usize, half_width: usize) -> &[u8] {
    let start = anchor.saturating_sub(half_width);
    let end = (anchor + half_width).min(data.len());
    &data[start..end]
}

/// Double value within the search window after `name`'s marker at `anchor`.
fn double_after_marker(data: &[u8], anchor: usize, name: &str) -> Option<f64> {
    let from = anchor + marker(name).len();
    let to = (from + VALUE_SEARCH_WINDOW).min(data.len());
    extract_double(&data[from.min(data.len())..to])
}

/// First plausible string for `name` anywhere in the record window.
fn string_field(window: &[u8], name: &str) -> Option<String> {
    let m = marker(name);
    marker_positions(window, name).into_iter().find_map(|pos| {
        let from = pos + m.len();
        let to = (from + STRING_SEARCH_WINDOW).min(window.len());
        extract_string(&window[from.min(window.len())..to])
    })
}

fn double_field(window: &[u8], name: &str) -> Option<f64> {
    let m = marker(name);
    marker_positions(window, name).into_iter().find_map(|pos| {
        let from = pos + m.len();
        let to = (from + VALUE_SEARCH_WINDOW).min(window.len());
        extract_double(&window[from.min(window.len())..to])
    })
}

fn boolean_field(window: &[u8], name: &str) -> Option<bool> {
    let m = marker(name);
    marker_positions(window, name).into_iter().find_map(|pos| {
        let from = pos + m.len();
        let to = (from + VALUE_SEARCH_WINDOW).min(window.len());
        extract_boolean(&window[from.min(window.len())..to])
    })
}

/// First string-tagged value in `region`: `0x8a 0x01`, length, printable
/// UTF-8 bytes.
fn extract_string(region: &[u8]) -> Option<String> {
    for i in 0..region.len().saturating_sub(2) {
        if region[i..i + 2] != TAG_STRING {
            continue;
        }
        let len = region[i + 2] as usize;
        let start = i + 3;
        let Some(bytes) = region.get(start..start + len) else {
            continue;
        };
        if len == 0 {
            continue;
        }
        if let Ok(s) = std::str::from_utf8(bytes) {
            if s.chars().all(|c| !c.is_control()) {
                return Some(s.to_string());
            }
        }
    }
    None
}

/// First double-tagged value in `region` that passes the money range gate,
/// rounded to cents.
fn extract_double(region: &[u8]) -> Option<f64> {
    for i in 0..region.len() {
        if region[i] != TAG_DOUBLE {
            continue;
        }
        let Some(bytes) = region.get(i + 1..i + 9) else {
            continue;
        };
        let v = f64::from_le_bytes(bytes.try_into().ok()?);
        if v.is_finite() && v.abs() <= MAX_ABS_AMOUNT {
            return Some((v * 100.0).round() / 100.0);
        }
    }
    None
}

fn extract_boolean(region: &[u8]) -> Option<bool> {
    for i in 0..region.len().saturating_sub(1) {
        if region[i] == TAG_BOOLEAN && region[i + 1] <= 1 {
            return Some(region[i + 1] == 1);
        }
    }
    None
}

/// Wraps recovered fields in a document under a synthesized key.
fn synthesize(collection: &str, document_id: &str, fields: FieldMap) -> Document {
    let key = format!("{collection}/{document_id}").into_bytes();
    Document::new(
        key,
        ParsedKey {
            collection: collection.to_string(),
            document_id: document_id.to_string(),
            parent_chain: Vec::new(),
        },
        fields,
    )
}

fn is_iso_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| matches!(i, 4 | 7) || c.is_ascii_digit())
}

fn is_iso_month(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 7
        && b[4] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_value(name: &str, value: &str) -> Vec<u8> {
        let mut out = marker(name);
        out.extend_from_slice(&TAG_STRING);
        out.push(value.len() as u8);
        out.extend_from_slice(value.as_bytes());
        out
    }

    fn double_value(name: &str, value: f64) -> Vec<u8> {
        let mut out = marker(name);
        out.push(TAG_DOUBLE);
        out.extend_from_slice(&value.to_le_bytes());
        out
    }

    #[test]
    fn recovers_transaction_from_raw_fragment() {
        let mut data = vec![0xff; 64]; // leading garbage
        data.extend(double_value("amount", -42.5));
        data.extend(string_value("date", "2025-02-03"));
        data.extend(string_value("name", "Corner Bakery"));
        data.extend(vec![0x00; 64]);

        let docs = scan_bytes(&data, "f0");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].leaf_collection(), "transactions");
        let f = &docs[0].fields;
        assert_eq!(f.get("amount").unwrap().as_f64(), Some(-42.5));
        assert_eq!(f.get("date").unwrap().as_str(), Some("2025-02-03"));
        assert_eq!(f.get("name").unwrap().as_str(), Some("Corner Bakery"));
    }

    #[test]
    fn amount_without_date_or_name_is_not_a_record() {
        let mut data = double_value("amount", -10.0);
        data.extend(vec![0x00; 32]);
        assert!(scan_bytes(&data, "f0").is_empty());
    }

    #[test]
    fn out_of_range_double_is_rejected() {
        let mut data = double_value("amount", 99_000_000.0);
        data.extend(string_value("date", "2025-02-03"));
        data.extend(string_value("name", "Bogus"));
        assert!(scan_bytes(&data, "f0").is_empty());
    }

    #[test]
    fn recovered_amount_rounds_to_cents() {
        let mut data = double_value("amount", 12.349);
        data.extend(string_value("date", "2025-02-03"));
        data.extend(string_value("name", "Rounding"));
        let docs = scan_bytes(&data, "f0");
        assert_eq!(docs[0].fields.get("amount").unwrap().as_f64(), Some(12.35));
    }

    #[test]
    fn recovers_account_around_balance_anchor() {
        let mut data = Vec::new();
        data.extend(string_value("name", "Everyday Checking"));
        data.extend(vec![0x11; 100]);
        data.extend(double_value("current_balance", 1234.56));
        data.extend(string_value("mask", "4321"));

        let docs = scan_bytes(&data, "f0");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].leaf_collection(), "accounts");
        assert_eq!(
            docs[0].fields.get("current_balance").unwrap().as_f64(),
            Some(1234.56)
        );
        assert_eq!(docs[0].fields.get("mask").unwrap().as_str(), Some("4321"));
    }

    #[test]
    fn recovers_goal_history_row() {
        let mut data = double_value("contribution", 250.0);
        data.extend(string_value("month", "2025-03"));
        data.extend(double_value("balance", 1750.0));

        let docs = scan_bytes(&data, "f0");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].leaf_collection(), "financial_goal_history");
        assert_eq!(docs[0].fields.get("month").unwrap().as_str(), Some("2025-03"));
        assert_eq!(docs[0].fields.get("balance").unwrap().as_f64(), Some(1750.0));
    }

    #[test]
    fn distinct_sources_yield_distinct_document_ids() {
        let mut data = double_value("amount", -42.5);
        data.extend(string_value("date", "2025-02-03"));
        data.extend(string_value("name", "Corner Bakery"));

        let from_a = scan_bytes(&data, "000007");
        let from_b = scan_bytes(&data, "000009");
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_b.len(), 1);
        assert_ne!(from_a[0].document_id, from_b[0].document_id);
    }

    #[test]
    fn string_search_respects_window() {
        // Value tag placed beyond the search window must not be picked up.
        let mut data = double_value("amount", -5.0);
        let mut far_date = marker("date");
        far_date.extend(vec![0x00; STRING_SEARCH_WINDOW + 10]);
        far_date.extend_from_slice(&TAG_STRING);
        far_date.push(10);
        far_date.extend_from_slice(b"2025-02-03");
        data.extend(far_date);
        data.extend(string_value("name", "Windowed"));
        assert!(scan_bytes(&data, "f0").is_empty());
    }
}
