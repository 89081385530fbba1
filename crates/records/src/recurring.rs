//! Recurring items: subscriptions and other repeating charges.

use firestore::Document;
use serde::Serialize;

use crate::fields::{get_money, get_str};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recurring {
    pub recurring_id: String,
    pub name: String,
    pub amount: Option<f64>,
    /// e.g. `monthly`, `yearly`.
    pub frequency: Option<String>,
    pub next_date: Option<String>,
    pub category_id: Option<String>,
    pub account_id: Option<String>,
}

impl Recurring {
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let fields = &doc.fields;
        let name = get_str(fields, &["name", "merchant_name"])?;
        Some(Self {
            recurring_id: get_str(fields, &["recurring_id"])
                .unwrap_or_else(|| doc.document_id.clone()),
            name,
            amount: get_money(fields, &["amount", "average_amount"]),
            frequency: get_str(fields, &["frequency"]),
            next_date: get_str(fields, &["next_date", "next_expected_date"]),
            category_id: get_str(fields, &["category_id"]),
            account_id: get_str(fields, &["account_id"]),
        })
    }
}
