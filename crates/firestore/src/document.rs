//! The generic document type handed to per-collection builders.

use crate::key::ParsedKey;
use crate::value::FieldMap;

/// One logical record from the cache: named, typed fields identified by
/// collection path + document id.
///
/// Within one decode pass, `(collection, document_id)` identifies exactly
/// one surviving version; fields are immutable once assembled. A document
/// is created the first time its key's final surviving version is seen and
/// discarded once routed to a builder.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The raw user key this document was assembled from.
    pub key: Vec<u8>,
    /// Full collection path (may span ancestors for subcollections).
    pub collection: String,
    /// Validated final path segment; never empty, never contains `/`.
    pub document_id: String,
    /// Ancestor `(collection, id)` pairs, outermost first.
    pub parent_chain: Vec<(String, String)>,
    /// Decoded field bag.
    pub fields: FieldMap,
}

impl Document {
    /// Assembles a document from a parsed key and decoded fields.
    #[must_use]
    pub fn new(key: Vec<u8>, parsed: ParsedKey, fields: FieldMap) -> Self {
        Self {
            key,
            collection: parsed.collection,
            document_id: parsed.document_id,
            parent_chain: parsed.parent_chain,
            fields,
        }
    }

    /// Last component of the collection path — what builders route on.
    #[must_use]
    pub fn leaf_collection(&self) -> &str {
        self.collection
            .rsplit('/')
            .next()
            .unwrap_or(&self.collection)
    }

    /// Ancestor document id for the named parent collection, e.g. the goal
    /// id for a `financial_goal_history` entry.
    #[must_use]
    pub fn parent_id(&self, parent_collection: &str) -> Option<&str> {
        self.parent_chain
            .iter()
            .find(|(c, _)| c == parent_collection)
            .map(|(_, id)| id.as_str())
    }
}
