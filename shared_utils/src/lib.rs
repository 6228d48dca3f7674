//! Shared Utilities for the video conversion tools
//!
//! This crate provides the building blocks used by `vid_h264`:
//! - FFprobe wrapper for codec/resolution detection
//! - FFmpeg process management (stderr draining, timeout)
//! - Checkpoint store for resumable batches
//! - Video discovery and batch counters
//! - Activity log and tracing setup
//! - Path helpers (output mirroring, archive naming, cross-device moves)

pub mod batch;
pub mod checkpoint;
pub mod common_utils;
pub mod conversion_types;
pub mod errors;
pub mod ffmpeg_process;
pub mod ffprobe;
pub mod logging;
pub mod types;

pub use batch::{collect_video_files, is_video_file, BatchResult, VIDEO_EXTENSIONS};
pub use checkpoint::{ProgressRecord, ProgressStore};
pub use conversion_types::{ConversionConfig, EncoderSettings};
pub use errors::{Result, VidConvertError};
pub use ffprobe::{FfprobeInspector, MediaInspector, ProbeOutcome, VideoStreamInfo};
pub use logging::{init_logging, ActivityLog, LogConfig};
pub use types::{FileSize, SizeDelta};
