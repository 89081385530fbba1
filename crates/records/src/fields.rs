//! Narrowing helpers: typed views over a document's field bag with synonym
//! resolution. All return `None` on absence or type mismatch — builders
//! gate on the result, they never raise.

use firestore::FieldMap;

use crate::money::normalize_amount;

pub(crate) fn get_str(fields: &FieldMap, names: &[&str]) -> Option<String> {
    fields
        .get_any(names)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

pub(crate) fn get_bool(fields: &FieldMap, names: &[&str]) -> Option<bool> {
    fields.get_any(names).and_then(|v| v.as_bool())
}

pub(crate) fn get_i64(fields: &FieldMap, names: &[&str]) -> Option<i64> {
    fields.get_any(names).and_then(|v| v.as_i64())
}

/// Raw numeric view, no money rules applied.
pub(crate) fn get_f64(fields: &FieldMap, names: &[&str]) -> Option<f64> {
    fields.get_any(names).and_then(|v| v.as_f64())
}

/// Money view: range-checked and rounded to cents.
pub(crate) fn get_money(fields: &FieldMap, names: &[&str]) -> Option<f64> {
    get_f64(fields, names).and_then(normalize_amount)
}

/// `YYYY-MM-DD` shape check (no calendar validation — the cache itself is
/// the authority on which dates exist).
pub(crate) fn is_iso_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| matches!(i, 4 | 7) || c.is_ascii_digit())
}

/// `YYYY-MM` shape check for month-keyed documents.
pub(crate) fn is_iso_month(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 7
        && b[4] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || c.is_ascii_digit())
}
