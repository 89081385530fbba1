//! Per-category monthly budgets.

use firestore::Document;
use serde::Serialize;

use crate::fields::{get_money, get_str, is_iso_month};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    pub budget_id: String,
    pub category_id: Option<String>,
    /// `YYYY-MM` when present.
    pub month: Option<String>,
    pub amount: f64,
}

impl Budget {
    /// Required: a budgeted amount. Month-shaped document ids double as the
    /// month when no explicit field exists.
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let fields = &doc.fields;
        let amount = get_money(fields, &["amount", "budget_amount"])?;
        let month = get_str(fields, &["month"])
            .or_else(|| Some(doc.document_id.clone()).filter(|id| is_iso_month(id)));
        Some(Self {
            budget_id: get_str(fields, &["budget_id"]).unwrap_or_else(|| doc.document_id.clone()),
            category_id: get_str(fields, &["category_id"]),
            month,
            amount,
        })
    }
}
