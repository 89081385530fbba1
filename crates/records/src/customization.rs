//! Per-account user customizations: renames, hiding, ordering.

use firestore::Document;
use serde::Serialize;

use crate::fields::{get_bool, get_i64, get_str};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAccountCustomization {
    /// The customized account. The document id is the account id.
    pub account_id: String,
    pub display_name: Option<String>,
    pub hidden: Option<bool>,
    /// Sort position in the app's account list.
    pub position: Option<i64>,
}

impl UserAccountCustomization {
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let fields = &doc.fields;
        let display_name = get_str(fields, &["display_name", "name"]);
        let hidden = get_bool(fields, &["hidden", "is_hidden"]);
        let position = get_i64(fields, &["position", "sort_order"]);
        if display_name.is_none() && hidden.is_none() && position.is_none() {
            return None;
        }
        Some(Self {
            account_id: get_str(fields, &["account_id"])
                .unwrap_or_else(|| doc.document_id.clone()),
            display_name,
            hidden,
            position,
        })
    }
}
