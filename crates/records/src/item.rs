//! Institution links ("items"): one per connected bank login.

use firestore::Document;
use serde::Serialize;

use crate::fields::get_str;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub item_id: String,
    pub institution_id: Option<String>,
    pub institution_name: Option<String>,
    /// Connection health, e.g. `good`, `login_required`.
    pub status: Option<String>,
}

impl Item {
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let fields = &doc.fields;
        let institution_id = get_str(fields, &["institution_id"]);
        let institution_name = get_str(fields, &["institution_name", "name"]);
        if institution_id.is_none() && institution_name.is_none() {
            return None;
        }
        Some(Self {
            item_id: get_str(fields, &["item_id"]).unwrap_or_else(|| doc.document_id.clone()),
            institution_id,
            institution_name,
            status: get_str(fields, &["status", "connection_status"]),
        })
    }
}
