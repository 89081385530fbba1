//! Directory scan: every table file → one merged document stream.
//!
//! ```text
//!  000005.ldb ─┐
//!  000007.ldb ─┼─▶ merge by user key, highest sequence wins ─▶ Documents
//!  000009.ldb ─┘         (a later delete removes the key)
//! ```
//!
//! Files the strict reader cannot open are handed to the heuristic
//! fallback scanner instead of being dropped; its recovered documents are
//! admitted only for `(collection, id)` pairs the strict path missed.

use anyhow::Result;
use firestore::{decode_document_fields, parse_key, Document};
use sstable::{RecordKind, TableReader};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

use crate::discover::table_files;
use crate::fallback;

/// Scans `db_path` and assembles every surviving document, optionally
/// keeping only one leaf collection.
///
/// # Errors
///
/// Fails only if the directory itself cannot be listed. Unreadable files
/// and malformed records degrade per the failure policy, they never abort
/// the scan.
pub fn scan_documents(db_path: &Path, collection: Option<&str>) -> Result<Vec<Document>> {
    let files = table_files(db_path)?;

    // Highest sequence number per user key across all files.
    let mut merged: BTreeMap<Vec<u8>, (u64, RecordKind, Vec<u8>)> = BTreeMap::new();
    let mut fallback_docs: Vec<Document> = Vec::new();

    for file in &files {
        match TableReader::open(file) {
            Ok(reader) => {
                for rec in reader.iter() {
                    match merged.get(&rec.key) {
                        Some((seq, _, _)) if *seq >= rec.seq => {}
                        _ => {
                            merged.insert(rec.key, (rec.seq, rec.kind, rec.value));
                        }
                    }
                }
            }
            Err(e) => {
                warn!(
                    file = %file.display(),
                    error = %e,
                    "strict open failed, rescanning heuristically"
                );
                if let Ok(data) = std::fs::read(file) {
                    fallback_docs.extend(fallback::scan_bytes(&data, &source_tag(file)));
                }
            }
        }
    }

    let mut documents = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    for (key, (_seq, kind, value)) in merged {
        if kind == RecordKind::Delete {
            continue;
        }
        let parsed = match parse_key(&key) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, key_len = key.len(), "skipping unparseable key");
                continue;
            }
        };
        let fields = decode_document_fields(&value);
        let doc = Document::new(key, parsed, fields);
        seen.insert((doc.collection.clone(), doc.document_id.clone()));
        documents.push(doc);
    }

    // Fallback documents fill gaps only; strict decodes always win.
    for doc in fallback_docs {
        let id = (doc.collection.clone(), doc.document_id.clone());
        if seen.insert(id) {
            documents.push(doc);
        }
    }

    if let Some(collection) = collection {
        documents.retain(|d| d.leaf_collection() == collection);
    }
    Ok(documents)
}

/// Identifier-safe tag for the file a fallback document came from, so
/// recoveries from different files never share a synthesized id.
fn source_tag(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
