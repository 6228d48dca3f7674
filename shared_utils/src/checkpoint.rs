//! Checkpoint & Resume Module
//!
//! Durable record of per-file outcomes so an interrupted batch resumes where it
//! stopped:
//! - `completed` / `failed` lists keyed by the original source path
//! - the whole record is rewritten after every single mutation
//! - writes go through a temp file + rename so a crash mid-save never leaves a
//!   truncated store behind
//!
//! # Usage
//! ```no_run
//! use shared_utils::checkpoint::ProgressStore;
//! use std::path::Path;
//!
//! fn main() -> shared_utils::Result<()> {
//!     let mut store = ProgressStore::load(Path::new("conversion_progress.json"))?;
//!     let file = "/videos/a.mkv";
//!
//!     if !store.is_processed(file) {
//!         // ... do conversion ...
//!         store.mark_completed(file)?;
//!     }
//!     Ok(())
//! }
//! ```

use crate::errors::{Result, VidConvertError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// ============================================================================
// ProgressRecord
// ============================================================================

/// On-disk document: `{"completed": [...], "failed": [...]}` in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub completed: Vec<String>,
    pub failed: Vec<String>,
}

impl ProgressRecord {
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.failed.is_empty()
    }

    /// Drop duplicate entries (first occurrence wins) and keep a path that
    /// appears in both lists only in `completed`. Returns the number of
    /// entries removed.
    pub fn normalize(&mut self) -> usize {
        let before = self.completed.len() + self.failed.len();

        let mut seen = HashSet::new();
        self.completed.retain(|p| seen.insert(p.clone()));
        // `seen` now holds every completed path
        self.failed.retain(|p| seen.insert(p.clone()));

        before - (self.completed.len() + self.failed.len())
    }
}

// ============================================================================
// ProgressStore
// ============================================================================

/// A [`ProgressRecord`] bound to its storage file.
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    record: ProgressRecord,
    index: HashSet<String>,
}

impl ProgressStore {
    /// Load the store, or start empty when the file does not exist.
    ///
    /// Malformed content is an error: silently resetting would redo work and
    /// re-archive originals.
    pub fn load(path: &Path) -> Result<Self> {
        let record = match fs::read_to_string(path) {
            Ok(content) => {
                let mut record: ProgressRecord = serde_json::from_str(&content).map_err(|source| {
                    VidConvertError::MalformedProgress {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                let removed = record.normalize();
                if removed > 0 {
                    warn!(path = %path.display(), removed, "Dropped duplicate progress entries");
                }
                debug!(
                    path = %path.display(),
                    completed = record.completed.len(),
                    failed = record.failed.len(),
                    "Loaded progress"
                );
                record
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => ProgressRecord::default(),
            Err(e) => return Err(VidConvertError::IoError(e)),
        };

        Ok(Self::with_record(path, record))
    }

    fn with_record(path: &Path, record: ProgressRecord) -> Self {
        let index = record
            .completed
            .iter()
            .chain(record.failed.iter())
            .cloned()
            .collect();
        Self {
            path: path.to_path_buf(),
            record,
            index,
        }
    }

    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    /// True once the file reached a terminal, recorded outcome.
    pub fn is_processed(&self, key: &str) -> bool {
        self.index.contains(key)
    }

    /// Is this a resumed run (previous progress present)?
    pub fn is_resume_mode(&self) -> bool {
        !self.record.is_empty()
    }

    /// Record success and persist immediately.
    pub fn mark_completed(&mut self, key: &str) -> Result<()> {
        if self.index.insert(key.to_string()) {
            self.record.completed.push(key.to_string());
            self.save()?;
        }
        Ok(())
    }

    /// Record failure and persist immediately.
    pub fn mark_failed(&mut self, key: &str) -> Result<()> {
        if self.index.insert(key.to_string()) {
            self.record.failed.push(key.to_string());
            self.save()?;
        }
        Ok(())
    }

    /// Overwrite the storage file with the full current record.
    pub fn save(&self) -> Result<()> {
        save_record(&self.record, &self.path)
    }
}

/// Serialize `record` to `path` via a sibling temp file and an atomic rename.
pub fn save_record(record: &ProgressRecord, path: &Path) -> Result<()> {
    let write_err = |source: io::Error| VidConvertError::ProgressWrite {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let json = serde_json::to_string_pretty(record)
        .map_err(|e| write_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.write_all(b"\n").map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = ProgressStore::load(&temp.path().join("progress.json")).unwrap();

        assert!(store.record().is_empty());
        assert!(!store.is_resume_mode());
    }

    #[test]
    fn test_malformed_store_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("progress.json");
        fs::write(&path, "{ not json").unwrap();

        let err = ProgressStore::load(&path).unwrap_err();
        assert!(matches!(err, VidConvertError::MalformedProgress { .. }));
        assert!(err.is_fatal());
        // the broken file is left untouched
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("progress.json");
        fs::write(&path, r#"{"completed": []}"#).unwrap();

        assert!(matches!(
            ProgressStore::load(&path),
            Err(VidConvertError::MalformedProgress { .. })
        ));
    }

    #[test]
    fn test_every_mark_is_persisted() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("progress.json");

        let mut store = ProgressStore::load(&path).unwrap();
        store.mark_completed("/src/a.mkv").unwrap();

        let on_disk: ProgressRecord =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.completed, vec!["/src/a.mkv"]);
        assert!(on_disk.failed.is_empty());

        store.mark_failed("/src/b.avi").unwrap();
        let on_disk: ProgressRecord =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.failed, vec!["/src/b.avi"]);
    }

    #[test]
    fn test_resume_after_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("progress.json");

        {
            let mut store = ProgressStore::load(&path).unwrap();
            store.mark_completed("video1.mp4").unwrap();
            store.mark_failed("video2.mkv").unwrap();
            // no explicit teardown - simulate interruption
        }

        let store = ProgressStore::load(&path).unwrap();
        assert!(store.is_resume_mode());
        assert!(store.is_processed("video1.mp4"));
        assert!(store.is_processed("video2.mkv"));
        assert!(!store.is_processed("video3.mov"));
    }

    #[test]
    fn test_marking_twice_does_not_duplicate() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("progress.json");

        let mut store = ProgressStore::load(&path).unwrap();
        store.mark_completed("a.mkv").unwrap();
        store.mark_completed("a.mkv").unwrap();
        store.mark_failed("a.mkv").unwrap();

        assert_eq!(store.record().completed, vec!["a.mkv"]);
        assert!(store.record().failed.is_empty());
    }

    #[test]
    fn test_load_normalizes_duplicates_and_overlap() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("progress.json");
        fs::write(
            &path,
            r#"{"completed": ["a", "b", "a"], "failed": ["b", "c", "c"]}"#,
        )
        .unwrap();

        let store = ProgressStore::load(&path).unwrap();
        assert_eq!(store.record().completed, vec!["a", "b"]);
        assert_eq!(store.record().failed, vec!["c"]);
    }

    #[test]
    fn test_saved_format_is_two_list_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("progress.json");
        let record = ProgressRecord {
            completed: vec!["x.mkv".to_string()],
            failed: vec![],
        };
        save_record(&record, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("{\n  \"completed\": [\n    \"x.mkv\"\n  ],"));
        assert!(content.contains("\"failed\": []"));
        // no temp files left next to the store
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nope").join("progress.json");
        let err = save_record(&ProgressRecord::default(), &path).unwrap_err();
        assert!(matches!(err, VidConvertError::ProgressWrite { .. }));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn normalize_leaves_each_path_in_at_most_one_list(
            completed in proptest::collection::vec("[a-d]", 0..12),
            failed in proptest::collection::vec("[a-d]", 0..12),
        ) {
            let mut record = ProgressRecord { completed, failed };
            record.normalize();

            let mut seen = HashSet::new();
            for p in record.completed.iter().chain(record.failed.iter()) {
                prop_assert!(seen.insert(p.clone()), "duplicate {}", p);
            }
        }
    }
}
