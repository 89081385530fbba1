//! Savings goals and their month-by-month history.

use firestore::Document;
use serde::Serialize;

use crate::fields::{get_money, get_str, is_iso_month};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Goal {
    pub goal_id: String,
    pub name: String,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub monthly_contribution: Option<f64>,
    /// e.g. `active`, `completed`.
    pub status: Option<String>,
}

impl Goal {
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let fields = &doc.fields;
        let name = get_str(fields, &["name"])?;
        Some(Self {
            goal_id: get_str(fields, &["goal_id"]).unwrap_or_else(|| doc.document_id.clone()),
            name,
            target_amount: get_money(fields, &["target_amount", "target"]),
            current_amount: get_money(fields, &["current_amount", "balance"]),
            monthly_contribution: get_money(fields, &["monthly_contribution", "contribution"]),
            status: get_str(fields, &["status"]),
        })
    }
}

/// One month of a goal's history. History documents live under a goal's
/// subcollection, so the owning goal id usually comes from the key path
/// rather than a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalHistory {
    pub goal_id: Option<String>,
    /// `YYYY-MM`. Month-shaped document ids double as the month.
    pub month: Option<String>,
    pub contribution: Option<f64>,
    pub balance: Option<f64>,
}

impl GoalHistory {
    /// Required: at least one of `contribution` / `balance` — a history row
    /// with neither carries no information.
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let fields = &doc.fields;
        let contribution = get_money(fields, &["contribution", "monthly_contribution"]);
        let balance = get_money(fields, &["balance", "current_amount"]);
        if contribution.is_none() && balance.is_none() {
            return None;
        }

        let goal_id = get_str(fields, &["goal_id"])
            .or_else(|| doc.parent_id("financial_goals").map(str::to_string));
        let month = get_str(fields, &["month"])
            .or_else(|| Some(doc.document_id.clone()).filter(|id| is_iso_month(id)));
        Some(Self {
            goal_id,
            month,
            contribution,
            balance,
        })
    }
}
