//! FileSize Type-Safe Wrapper
//!
//! Byte counts with human-readable formatting and signed size-delta reporting
//! for before/after conversion comparisons.

use std::fmt;

// ============================================================================
// FileSize Newtype
// ============================================================================

/// Type-safe file size in bytes.
///
/// # Examples
/// ```
/// use shared_utils::types::file_size::FileSize;
///
/// let size = FileSize::new(1536);
/// assert_eq!(size.bytes(), 1536);
/// assert_eq!(size.display(), "1.5 KB");
///
/// let converted = FileSize::new(800_000);
/// assert_eq!(converted.delta_from(FileSize::new(1_000_000)).percent_label(), "-20.0%");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FileSize(u64);

impl FileSize {
    pub const KB: u64 = 1024;
    pub const MB: u64 = 1024 * 1024;
    pub const GB: u64 = 1024 * 1024 * 1024;

    #[inline]
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn bytes(&self) -> u64 {
        self.0
    }

    /// Percentage change relative to `original`: (self - original) / original * 100.
    ///
    /// Negative means the file shrank. `None` when `original` is empty.
    pub fn size_change_percent(&self, original: FileSize) -> Option<f64> {
        if original.0 == 0 {
            None
        } else {
            Some((self.0 as f64 - original.0 as f64) / original.0 as f64 * 100.0)
        }
    }

    /// Signed delta of `self` (new size) against `original`.
    pub fn delta_from(&self, original: FileSize) -> SizeDelta {
        SizeDelta {
            original,
            new: *self,
        }
    }

    /// Human-readable size: bytes are exact, KB and MB use one decimal, GB two.
    pub fn display(&self) -> String {
        if self.0 < Self::KB {
            format!("{} B", self.0)
        } else if self.0 < Self::MB {
            format!("{:.1} KB", self.0 as f64 / Self::KB as f64)
        } else if self.0 < Self::GB {
            format!("{:.1} MB", self.0 as f64 / Self::MB as f64)
        } else {
            format!("{:.2} GB", self.0 as f64 / Self::GB as f64)
        }
    }
}

impl fmt::Debug for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileSize({})", self.0)
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

// ============================================================================
// SizeDelta
// ============================================================================

/// Before/after comparison of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeDelta {
    pub original: FileSize,
    pub new: FileSize,
}

impl SizeDelta {
    pub fn grew(&self) -> bool {
        self.new >= self.original
    }

    /// Absolute byte difference, independent of direction.
    pub fn magnitude(&self) -> FileSize {
        FileSize(self.new.0.abs_diff(self.original.0))
    }

    /// `+20.0%` / `-20.0%`; `n/a` for an empty original.
    pub fn percent_label(&self) -> String {
        match self.new.size_change_percent(self.original) {
            Some(pct) => {
                let sign = if self.grew() { '+' } else { '-' };
                format!("{}{:.1}%", sign, pct.abs())
            }
            None => "n/a".to_string(),
        }
    }
}

impl fmt::Display for SizeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.magnitude().display(), self.percent_label())
    }
}
