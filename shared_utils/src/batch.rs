//! Batch Processing Module
//!
//! File discovery for a conversion batch and the per-run outcome counters.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Video containers picked up by discovery. Matching is case-sensitive.
pub const VIDEO_EXTENSIONS: &[&str] = &["avi", "mkv", "mp4", "mov", "wmv", "flv", "webm"];

/// Case-sensitive extension check against [`VIDEO_EXTENSIONS`].
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Recursively collect regular video files under `root`, sorted by path.
///
/// Symlinks are neither followed nor returned. Directories listed in
/// `exclude` (typically the destination and archive roots when they live
/// inside the source tree) are not descended into. Unreadable entries are
/// skipped.
pub fn collect_video_files(root: &Path, exclude: &[PathBuf]) -> Vec<PathBuf> {
    let excluded: Vec<PathBuf> = exclude
        .iter()
        .filter_map(|p| fs::canonicalize(p).ok())
        .collect();

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, &excluded))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(error = %err, "Skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_video_file(e.path()))
        .map(DirEntry::into_path)
        .collect();

    files.sort();
    files
}

fn is_excluded_dir(entry: &DirEntry, excluded: &[PathBuf]) -> bool {
    if excluded.is_empty() || entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    match fs::canonicalize(entry.path()) {
        Ok(canonical) => excluded.contains(&canonical),
        Err(_) => false,
    }
}

// ============================================================================
// BatchResult
// ============================================================================

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub total: usize,
    pub converted: usize,
    pub already_processed: usize,
    pub already_target: usize,
    pub output_exists: usize,
    pub failed: usize,
    pub errors: Vec<(PathBuf, String)>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn converted(&mut self) {
        self.total += 1;
        self.converted += 1;
    }

    pub fn already_processed(&mut self) {
        self.total += 1;
        self.already_processed += 1;
    }

    pub fn already_target(&mut self) {
        self.total += 1;
        self.already_target += 1;
    }

    pub fn output_exists(&mut self) {
        self.total += 1;
        self.output_exists += 1;
    }

    pub fn fail(&mut self, path: PathBuf, error: String) {
        self.total += 1;
        self.failed += 1;
        self.errors.push((path, error));
    }

    pub fn skipped(&self) -> usize {
        self.already_processed + self.already_target + self.output_exists
    }
}
