//! Locating the cache directory on disk.
//!
//! The finance app keeps its offline Firestore cache inside its sandboxed
//! container. The canonical location is the macOS container path; a couple
//! of generic application-support fallbacks cover relocated installs and
//! copies made for inspection.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Relative path from the app container to the LevelDB directory.
const CONTAINER_SUFFIX: &str =
    "Library/Application Support/firestore/__FIRAPP_DEFAULT/copilot-production-22904/main";

/// macOS sandbox container for the production app.
const MACOS_CONTAINER: &str = "Library/Containers/com.copilot.production/Data";

/// Candidate cache directories, most specific first.
#[must_use]
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(MACOS_CONTAINER).join(CONTAINER_SUFFIX));
    }
    if let Some(data) = dirs::data_dir() {
        candidates.push(
            data.join("firestore/__FIRAPP_DEFAULT/copilot-production-22904/main"),
        );
    }
    candidates
}

/// True when `dir` looks like a populated cache: it exists and holds at
/// least one table (`*.ldb`) or `MANIFEST*` file.
#[must_use]
pub fn holds_table_files(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries.filter_map(Result::ok).any(|e| {
        let name = e.file_name();
        let name = name.to_string_lossy();
        name.ends_with(".ldb") || name.starts_with("MANIFEST")
    })
}

/// First candidate directory that holds table files, if any.
#[must_use]
pub fn discover_database() -> Option<PathBuf> {
    for candidate in candidate_paths() {
        if holds_table_files(&candidate) {
            debug!(path = %candidate.display(), "discovered cache directory");
            return Some(candidate);
        }
    }
    None
}

/// All `*.ldb` files in `dir`, sorted by file name for a deterministic
/// scan order.
pub fn table_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "ldb"))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_directory_holds_no_tables() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!holds_table_files(dir.path()));
    }

    #[test]
    fn ldb_file_marks_directory_as_populated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("000005.ldb"), b"x").unwrap();
        assert!(holds_table_files(dir.path()));
    }

    #[test]
    fn manifest_alone_marks_directory_as_populated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("MANIFEST-000004"), b"x").unwrap();
        assert!(holds_table_files(dir.path()));
    }

    #[test]
    fn table_files_are_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("000007.ldb"), b"x").unwrap();
        std::fs::write(dir.path().join("000005.ldb"), b"x").unwrap();
        std::fs::write(dir.path().join("CURRENT"), b"x").unwrap();
        let files = table_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["000005.ldb", "000007.ldb"]);
    }
}
