//! Spending categories, including user-defined ones.

use firestore::Document;
use serde::Serialize;

use crate::fields::get_str;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub category_id: String,
    /// Falls back to the id: built-in categories often store no name field
    /// because the id is the name.
    pub name: String,
    pub parent_category_id: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl Category {
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let fields = &doc.fields;
        let category_id =
            get_str(fields, &["category_id"]).unwrap_or_else(|| doc.document_id.clone());
        let name = get_str(fields, &["name"]).unwrap_or_else(|| category_id.clone());
        Some(Self {
            category_id,
            name,
            parent_category_id: get_str(fields, &["parent_category_id", "parent_id"]),
            icon: get_str(fields, &["icon", "emoji"]),
            color: get_str(fields, &["color"]),
        })
    }
}
