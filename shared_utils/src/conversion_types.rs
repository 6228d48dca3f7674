//! Conversion configuration types shared by the converter binary and its engine.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Codec name (as reported by ffprobe) that needs no conversion.
pub const TARGET_CODEC: &str = "h264";

/// Container extension for converted outputs.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// FFmpeg video encoder used for conversion.
pub const VIDEO_ENCODER: &str = "libx264";

pub const DEFAULT_CRF: u8 = 18;
pub const MAX_CRF: u8 = 51;
pub const DEFAULT_PRESET: &str = "faster";

/// x264 presets accepted by `-preset`.
pub const X264_PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
    "placebo",
];

/// Encoder knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    pub crf: u8,
    pub preset: String,
    /// Kill the encoder after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            crf: DEFAULT_CRF,
            preset: DEFAULT_PRESET.to_string(),
            timeout: None,
        }
    }
}

impl EncoderSettings {
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf.min(MAX_CRF);
        self
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Directories of one conversion run.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Tree scanned for videos. Also the base for mirroring subdirectories.
    pub source_dir: PathBuf,
    /// Root of converted outputs.
    pub output_dir: PathBuf,
    /// Flat directory receiving the originals after conversion.
    pub archive_dir: PathBuf,
    pub target_codec: String,
}

impl ConversionConfig {
    pub fn new(
        source_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        archive_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            source_dir: source_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            archive_dir: archive_dir.as_ref().to_path_buf(),
            target_codec: TARGET_CODEC.to_string(),
        }
    }
}
