//! # session — decode sessions over the offline cache
//!
//! The top of the firesift stack: resolves the cache directory, runs the
//! scan, and hands out typed collections.
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!   |
//!   v
//! ┌──────────────────────────────────────────────┐
//! │                  SESSION                     │
//! │                                              │
//! │ discover.rs → candidate paths → db_path      │
//! │                                              │
//! │ documents() → scan.rs                        │
//! │     every .ldb → merge by key, max seq       │
//! │     strict-open failure → fallback.rs        │
//! │                                              │
//! │ dataset() → one scan → Dataset (11 colls)    │
//! │     cached in a OnceCell for the session;    │
//! │     concurrent first callers coalesce        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                              |
//! |--------------|------------------------------------------------------|
//! | [`lib.rs`]   | `Session` struct, availability probe, dataset cache  |
//! | [`discover`] | OS-specific cache path candidates, table-file listing|
//! | `scan`       | merged multi-file document stream                    |
//! | [`fallback`] | heuristic recovery for files strict parsing rejects  |
//!
//! The cache is read strictly read-only; nothing here ever writes into the
//! database directory.

mod error;

pub mod discover;
pub mod fallback;
mod scan;

use anyhow::Result;
use firestore::Document;
use once_cell::sync::OnceCell;
use records::Dataset;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub use error::SessionError;

/// Summary of what the cache currently holds, cheap after the first
/// [`Session::dataset`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheInfo {
    /// `YYYY-MM-DD` of the oldest decoded transaction, if any.
    pub oldest_transaction_date: Option<String>,
    /// `YYYY-MM-DD` of the newest decoded transaction, if any.
    pub newest_transaction_date: Option<String>,
    pub transaction_count: usize,
}

/// One decode session against one cache directory.
///
/// Holds the resolved path and a lazily populated dataset cache. The first
/// [`dataset`](Session::dataset) call scans the directory once for all
/// collections; every later call (and every per-collection accessor)
/// shares that result. Concurrent first callers coalesce: one thread
/// decodes, the others block on the cell and receive the same `Arc`.
pub struct Session {
    db_path: PathBuf,
    dataset: OnceCell<Arc<Dataset>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("db_path", &self.db_path)
            .field("dataset_cached", &self.dataset.get().is_some())
            .finish()
    }
}

impl Session {
    /// Opens a session against an explicit cache directory.
    ///
    /// # Errors
    ///
    /// [`SessionError::DatabaseNotFound`] if the directory does not exist.
    /// An existing but empty directory is fine; it decodes to empty
    /// collections.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if !db_path.is_dir() {
            return Err(SessionError::DatabaseNotFound { path: db_path }.into());
        }
        Ok(Self {
            db_path,
            dataset: OnceCell::new(),
        })
    }

    /// Opens a session against the first discovered cache location.
    ///
    /// # Errors
    ///
    /// [`SessionError::DatabaseNotFound`] when no candidate directory holds
    /// table files.
    pub fn discover() -> Result<Self> {
        let db_path = discover::discover_database().ok_or_else(|| {
            SessionError::DatabaseNotFound {
                path: discover::candidate_paths()
                    .into_iter()
                    .next()
                    .unwrap_or_default(),
            }
        })?;
        info!(path = %db_path.display(), "using discovered cache directory");
        Self::open(db_path)
    }

    /// Directory this session reads from.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// True when the directory exists and holds at least one table or
    /// manifest file. The only probe that never fails.
    #[must_use]
    pub fn is_available(&self) -> bool {
        discover::holds_table_files(&self.db_path)
    }

    /// Scans the directory and assembles every surviving document,
    /// optionally filtered to one leaf collection. Each call re-reads from
    /// scratch; use [`dataset`](Session::dataset) for the cached batch
    /// path.
    ///
    /// # Errors
    ///
    /// [`SessionError::DatabaseNotFound`] if the directory vanished since
    /// the session opened.
    pub fn documents(&self, collection: Option<&str>) -> Result<Vec<Document>> {
        if !self.db_path.is_dir() {
            return Err(SessionError::DatabaseNotFound {
                path: self.db_path.clone(),
            }
            .into());
        }
        scan::scan_documents(&self.db_path, collection)
    }

    /// All eleven typed collections, decoded in one scan and cached for
    /// the life of the session.
    ///
    /// # Errors
    ///
    /// [`SessionError::DatabaseNotFound`] if the directory vanished since
    /// the session opened. The error is not cached; a later call retries.
    pub fn dataset(&self) -> Result<Arc<Dataset>> {
        self.dataset
            .get_or_try_init(|| {
                let docs = self.documents(None)?;
                let mut ds = Dataset::new();
                for doc in &docs {
                    ds.ingest(doc);
                }
                ds.finish();
                info!(
                    documents = docs.len(),
                    records = ds.len(),
                    "decoded cache dataset"
                );
                Ok(Arc::new(ds))
            })
            .cloned()
    }

    /// Date range and count of decoded transactions.
    ///
    /// # Errors
    ///
    /// Same as [`dataset`](Session::dataset).
    pub fn cache_info(&self) -> Result<CacheInfo> {
        let ds = self.dataset()?;
        // Transactions are ordered newest-first.
        Ok(CacheInfo {
            newest_transaction_date: ds.transactions.first().map(|t| t.date.clone()),
            oldest_transaction_date: ds.transactions.last().map(|t| t.date.clone()),
            transaction_count: ds.transactions.len(),
        })
    }
}

#[cfg(test)]
mod tests;
