//! Transaction records: the highest-volume collection in the cache.

use firestore::Document;
use serde::Serialize;

use crate::fields::{get_bool, get_money, get_str, is_iso_date};

/// One financial transaction. Positive amounts are expenses, negative
/// amounts income/credits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub amount: f64,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub name: Option<String>,
    pub original_name: Option<String>,
    pub account_id: Option<String>,
    pub category_id: Option<String>,
    pub iso_currency_code: Option<String>,
    pub pending: Option<bool>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub transaction_type: Option<String>,
    /// Derived: `type == "internal_transfer"`. Transfers between the user's
    /// own accounts are not spending.
    pub internal_transfer: bool,
}

impl Transaction {
    /// Best human-readable name: `name`, else `original_name`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.original_name.as_deref())
            .unwrap_or("Unknown")
    }

    /// Builds a transaction from a decoded document.
    ///
    /// Required: a valid money `amount`, an ISO `date`, and at least one of
    /// `name` / `original_name`. Anything missing or malformed drops the
    /// record (`None`) — one bad record never aborts a batch.
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let fields = &doc.fields;
        let amount = get_money(fields, &["amount"])?;
        let date = get_str(fields, &["date", "original_date"]).filter(|d| is_iso_date(d))?;
        let name = get_str(fields, &["name"]);
        let original_name = get_str(fields, &["original_name", "original_clean_name"]);
        if name.is_none() && original_name.is_none() {
            return None;
        }

        let transaction_id =
            get_str(fields, &["transaction_id"]).unwrap_or_else(|| doc.document_id.clone());
        let transaction_type = get_str(fields, &["type", "transaction_type"]);
        let internal_transfer = transaction_type.as_deref() == Some("internal_transfer");

        Some(Self {
            transaction_id,
            amount,
            date,
            name,
            original_name,
            account_id: get_str(fields, &["account_id"]),
            category_id: get_str(fields, &["category_id"]),
            iso_currency_code: get_str(fields, &["iso_currency_code"]),
            pending: get_bool(fields, &["pending"]),
            city: get_str(fields, &["city"]),
            region: get_str(fields, &["region"]),
            transaction_type,
            internal_transfer,
        })
    }
}
