//! Investment market data: daily security prices and split events.

use firestore::Document;
use serde::Serialize;

use crate::fields::{get_f64, get_money, get_str, is_iso_date};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentPrice {
    pub price_id: String,
    pub symbol: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub price: f64,
}

impl InvestmentPrice {
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let fields = &doc.fields;
        let symbol = get_str(fields, &["symbol", "ticker"])?;
        let date = get_str(fields, &["date"]).filter(|d| is_iso_date(d))?;
        let price = get_money(fields, &["price", "close_price"])?;
        Some(Self {
            price_id: get_str(fields, &["price_id"]).unwrap_or_else(|| doc.document_id.clone()),
            symbol,
            date,
            price,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentSplit {
    pub split_id: String,
    pub symbol: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Shares-out per share-in, e.g. 4.0 for a 4:1 split. Not a money
    /// amount, so no cent rounding applies.
    pub ratio: f64,
}

impl InvestmentSplit {
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let fields = &doc.fields;
        let symbol = get_str(fields, &["symbol", "ticker"])?;
        let date = get_str(fields, &["date"]).filter(|d| is_iso_date(d))?;
        let ratio =
            get_f64(fields, &["ratio", "split_ratio"]).filter(|r| r.is_finite() && *r > 0.0)?;
        Some(Self {
            split_id: get_str(fields, &["split_id"]).unwrap_or_else(|| doc.document_id.clone()),
            symbol,
            date,
            ratio,
        })
    }
}
