//! vid-h264 - Resumable batch conversion of a video library to H.264 MP4
//!
//! Walks a source tree, re-encodes everything that is not already H.264,
//! mirrors the tree into a destination root, moves originals to an archive
//! and checkpoints every outcome so an interrupted run picks up where it
//! stopped.
//!
//! ```rust,ignore
//! use vid_h264::{run_conversion, FfmpegH264Encoder, RunConfig};
//! use shared_utils::{ConversionConfig, FfprobeInspector};
//!
//! let config = RunConfig::new(ConversionConfig::new("videos", "converted", "originals"));
//! let report = run_conversion(&config, FfprobeInspector::default(), FfmpegH264Encoder::default(), Default::default())?;
//! ```

pub mod cli_runner;
pub mod conversion_api;
pub mod encoder;

pub use cli_runner::{run_conversion, RunConfig, RunReport};
pub use conversion_api::{ConversionEngine, FileOutcome};
pub use encoder::{FfmpegH264Encoder, VideoEncoder};
