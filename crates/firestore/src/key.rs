//! Collection/document identity from raw cache keys.
//!
//! A raw key carries (after whatever binary prefix the container added) a
//! path of alternating `collection / document-id` segments, e.g.
//!
//! ```text
//! users/{uid}/financial_goals/{gid}/financial_goal_history/{month}
//! ```
//!
//! The parser walks right-to-left: the trailing run of path-safe bytes is
//! split on `/`, the final segment becomes the document-id candidate, and
//! everything before it joins into the collection path. The candidate must
//! pass the identifier heuristic below; ambiguous or too-short candidates
//! are rejected and the record skipped — never guessed.

use thiserror::Error;

/// Minimum length an identifier candidate must have. Real document ids are
/// 20+ characters, budget/goal-history months are 7 (`2025-01`); anything
/// shorter is more likely a stray path fragment.
pub const DOC_ID_MIN_LEN: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// The key holds no recognizable `collection/id` path.
    #[error("key contains no path segments")]
    NoPath,
    /// The trailing segment failed the identifier heuristic.
    #[error("ambiguous document id candidate {candidate:?}")]
    AmbiguousKey { candidate: String },
}

/// Identity derived from one raw key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    /// Full collection path, e.g.
    /// `users/u1/financial_goals/g1/financial_goal_history`.
    pub collection: String,
    /// Final path segment, validated by the identifier heuristic.
    pub document_id: String,
    /// Ancestor `(collection, document_id)` pairs, outermost first, so
    /// builders can recover parent ids for nested subcollections.
    pub parent_chain: Vec<(String, String)>,
}

impl ParsedKey {
    /// Last component of the collection path — the name builders route on.
    #[must_use]
    pub fn leaf_collection(&self) -> &str {
        self.collection
            .rsplit('/')
            .next()
            .unwrap_or(&self.collection)
    }
}

fn is_segment_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn is_valid_document_id(candidate: &str) -> bool {
    candidate.len() >= DOC_ID_MIN_LEN
        && candidate.bytes().any(|b| b.is_ascii_alphanumeric())
        && candidate.bytes().all(is_segment_byte)
}

/// Derives collection path and document id from a raw key.
///
/// # Errors
///
/// [`KeyError::NoPath`] when no `collection/id` pair can be found;
/// [`KeyError::AmbiguousKey`] when the trailing segment fails the
/// identifier heuristic. Both mean the record is skipped.
pub fn parse_key(key: &[u8]) -> Result<ParsedKey, KeyError> {
    // Trailing run of path-safe bytes (segments + separators), right-to-left.
    let mut start = key.len();
    while start > 0 {
        let b = key[start - 1];
        if is_segment_byte(b) || b == b'/' {
            start -= 1;
        } else {
            break;
        }
    }
    // All-ASCII by construction of the scan above.
    let path = std::str::from_utf8(&key[start..]).map_err(|_| KeyError::NoPath)?;

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return Err(KeyError::NoPath);
    }

    let candidate = *segments.last().unwrap();
    if !is_valid_document_id(candidate) {
        return Err(KeyError::AmbiguousKey {
            candidate: candidate.to_string(),
        });
    }

    let ancestors = &segments[..segments.len() - 1];
    let collection = ancestors.join("/");
    let parent_chain = ancestors
        .chunks_exact(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect();

    Ok(ParsedKey {
        collection,
        document_id: candidate.to_string(),
        parent_chain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_two_segment_key() {
        let parsed = parse_key(b"accounts/AbCdEfGhIjKlMnOpQrStUvW").unwrap();
        assert_eq!(parsed.collection, "accounts");
        assert_eq!(parsed.document_id, "AbCdEfGhIjKlMnOpQrStUvW");
        assert_eq!(parsed.document_id.len(), 23);
        assert!(parsed.parent_chain.is_empty());
        assert_eq!(parsed.leaf_collection(), "accounts");
    }

    #[test]
    fn binary_prefix_is_ignored() {
        let mut key = vec![0x00, 0x01, 0xff];
        key.extend_from_slice(b"users/u123/transactions/txn_000042");
        let parsed = parse_key(&key).unwrap();
        assert_eq!(parsed.collection, "users/u123/transactions");
        assert_eq!(parsed.document_id, "txn_000042");
        assert_eq!(parsed.leaf_collection(), "transactions");
        assert_eq!(
            parsed.parent_chain,
            vec![("users".to_string(), "u123".to_string())]
        );
    }

    #[test]
    fn nested_subcollection_preserves_ancestor_chain() {
        let parsed =
            parse_key(b"users/u1/financial_goals/goal_7/financial_goal_history/2025-01").unwrap();
        assert_eq!(parsed.document_id, "2025-01");
        assert_eq!(parsed.leaf_collection(), "financial_goal_history");
        assert_eq!(
            parsed.parent_chain,
            vec![
                ("users".to_string(), "u1".to_string()),
                ("financial_goals".to_string(), "goal_7".to_string()),
            ]
        );
    }

    #[test]
    fn too_short_candidate_is_ambiguous() {
        let err = parse_key(b"accounts/ab").unwrap_err();
        assert!(matches!(err, KeyError::AmbiguousKey { .. }));
    }

    #[test]
    fn separator_only_or_empty_keys_are_rejected() {
        assert_eq!(parse_key(b""), Err(KeyError::NoPath));
        assert_eq!(parse_key(b"///"), Err(KeyError::NoPath));
        assert_eq!(parse_key(b"transactions"), Err(KeyError::NoPath));
        assert_eq!(parse_key(&[0xde, 0xad, 0xbe, 0xef]), Err(KeyError::NoPath));
    }

    #[test]
    fn candidate_without_alphanumerics_is_ambiguous() {
        assert!(matches!(
            parse_key(b"accounts/---"),
            Err(KeyError::AmbiguousKey { .. })
        ));
    }

    #[test]
    fn document_id_never_contains_separator() {
        let parsed = parse_key(b"users/u1/categories/cat_food").unwrap();
        assert!(!parsed.document_id.contains('/'));
        assert!(!parsed.collection.is_empty());
    }
}
