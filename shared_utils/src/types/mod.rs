//! Type-Safe Wrappers Module
//!
//! - `file_size`: byte counts, human-readable sizes and signed size deltas

pub mod file_size;

pub use file_size::{FileSize, SizeDelta};
