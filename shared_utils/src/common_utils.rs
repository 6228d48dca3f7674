//! Common Utilities Module
//!
//! Path and file helpers shared by the conversion pipeline:
//! directory creation, output/archive path computation and moving files
//! across filesystems.

use crate::errors::{Result, VidConvertError};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

// ═══════════════════════════════════════════════════════════════
// Directories
// ═══════════════════════════════════════════════════════════════

/// Create `dir` and all missing parents. Existing directories are fine.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use shared_utils::common_utils::ensure_dir_exists;
///
/// ensure_dir_exists(Path::new("/tmp/test/nested/dir")).unwrap();
/// ```
pub fn ensure_dir_exists(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| VidConvertError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

// ═══════════════════════════════════════════════════════════════
// Output / archive paths
// ═══════════════════════════════════════════════════════════════

/// Mirror `input`'s location under `source_dir` into `output_dir`, replacing
/// the extension with `extension`.
///
/// `/in/show/ep1.mkv` with source `/in`, output `/out` and `mp4` becomes
/// `/out/show/ep1.mp4`. An input outside `source_dir` lands directly in
/// `output_dir`.
pub fn output_path_for(
    input: &Path,
    source_dir: &Path,
    output_dir: &Path,
    extension: &str,
) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));

    let rel_dir = input
        .strip_prefix(source_dir)
        .ok()
        .and_then(Path::parent)
        .unwrap_or(Path::new(""));

    let mut name = stem;
    name.push(".");
    name.push(extension);
    output_dir.join(rel_dir).join(name)
}

/// Hidden sibling the encoder writes to before the result is renamed into
/// place: `/out/show/ep1.mp4` -> `/out/show/.ep1.mp4.part`.
pub fn partial_path_for(output: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(output.file_name().unwrap_or_default());
    name.push(".part");
    output.with_file_name(name)
}

/// Flattened archive location for `input`: `archive_dir/<file name>`.
///
/// If that name is taken, `stem (1).ext`, `stem (2).ext`, ... are tried so an
/// archived original is never overwritten.
pub fn archive_path_for(input: &Path, archive_dir: &Path) -> PathBuf {
    let file_name = input.file_name().unwrap_or_default();
    let candidate = archive_dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().map(|e| e.to_string_lossy());
    (1u32..)
        .map(|n| {
            let name = match &ext {
                Some(ext) => format!("{} ({}).{}", stem, n, ext),
                None => format!("{} ({})", stem, n),
            };
            archive_dir.join(name)
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

// ═══════════════════════════════════════════════════════════════
// Moving files
// ═══════════════════════════════════════════════════════════════

/// Move `from` to `to`. A plain rename when both are on one filesystem,
/// otherwise copy then remove the source.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            debug!(from = %from.display(), to = %to.display(), "Cross-device move, copying");
            if let Err(copy_err) = fs::copy(from, to) {
                let _ = fs::remove_file(to);
                return Err(copy_err);
            }
            fs::remove_file(from)
        }
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn is_cross_device(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(not(unix))]
fn is_cross_device(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::CrossesDevices
}
