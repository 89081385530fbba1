//! Account records: checking, savings, credit, investment, loan.

use firestore::Document;
use serde::Serialize;

use crate::fields::{get_money, get_str};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub account_id: String,
    pub current_balance: f64,
    pub available_balance: Option<f64>,
    pub name: Option<String>,
    pub official_name: Option<String>,
    /// Resolved through the synonym chain `account_type` ← `type` ←
    /// `original_type`.
    pub account_type: Option<String>,
    pub subtype: Option<String>,
    /// Last digits of the account number, as shown in the app.
    pub mask: Option<String>,
    pub institution_name: Option<String>,
    pub iso_currency_code: Option<String>,
}

impl Account {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.official_name.as_deref())
            .unwrap_or("Unknown")
    }

    /// Required: a balance (synonym `original_current_balance`) and at
    /// least one of `name` / `official_name`. The account id falls back to
    /// the document id, which is the canonical identifier in the cache.
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let fields = &doc.fields;
        let current_balance =
            get_money(fields, &["current_balance", "original_current_balance"])?;
        let name = get_str(fields, &["name"]);
        let official_name = get_str(fields, &["official_name"]);
        if name.is_none() && official_name.is_none() {
            return None;
        }

        Some(Self {
            account_id: get_str(fields, &["account_id"])
                .unwrap_or_else(|| doc.document_id.clone()),
            current_balance,
            available_balance: get_money(fields, &["available_balance"]),
            name,
            official_name,
            account_type: get_str(fields, &["account_type", "type", "original_type"]),
            subtype: get_str(fields, &["subtype"]),
            mask: get_str(fields, &["mask"]),
            institution_name: get_str(fields, &["institution_name"]),
            iso_currency_code: get_str(fields, &["iso_currency_code"]),
        })
    }
}
