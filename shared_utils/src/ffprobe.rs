//! FFprobe wrapper module
//!
//! Best-effort metadata for the first video stream of a file. Probe failures
//! never block a conversion: they surface as [`ProbeOutcome::Unknown`] and the
//! codec check answers "not the target codec".

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

pub const UNKNOWN: &str = "unknown";

/// Placeholder ffprobe prints for a dimension it cannot determine.
const NOT_AVAILABLE: &str = "N/A";

#[derive(Error, Debug)]
pub enum FFprobeError {
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ffprobe exited with status {0:?}")]
    ExitStatus(Option<i32>),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Codec and dimensions of a video stream. A dimension ffprobe could not
/// report is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStreamInfo {
    pub codec: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl VideoStreamInfo {
    pub fn resolution(&self) -> String {
        let dim = |d: Option<u32>| d.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string());
        format!("{}x{}", dim(self.width), dim(self.height))
    }
}

/// Result of the wide (codec + resolution) probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Detected(VideoStreamInfo),
    /// Metadata could not be read; carries the reason for diagnostics.
    Unknown(String),
}

impl ProbeOutcome {
    pub fn codec_label(&self) -> &str {
        match self {
            ProbeOutcome::Detected(info) => &info.codec,
            ProbeOutcome::Unknown(_) => UNKNOWN,
        }
    }

    pub fn resolution_label(&self) -> String {
        match self {
            ProbeOutcome::Detected(info) => info.resolution(),
            ProbeOutcome::Unknown(_) => UNKNOWN.to_string(),
        }
    }
}

/// Media inspection seam used by the conversion engine.
pub trait MediaInspector {
    /// Codec and resolution of the first video stream. Never fails.
    fn detect_codec(&self, path: &Path) -> ProbeOutcome;

    /// True only when the first video stream's codec name equals `target`
    /// exactly. Any probe error answers false.
    fn is_target_codec(&self, path: &Path, target: &str) -> bool;
}

/// [`MediaInspector`] backed by the `ffprobe` executable.
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    program: PathBuf,
}

impl Default for FfprobeInspector {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeInspector {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run a csv query against stream `v:0` and return trimmed stdout.
    fn query(&self, path: &Path, entries: &str) -> Result<String, FFprobeError> {
        let output = Command::new(&self.program)
            .args([
                "-v",
                "quiet",
                "-select_streams",
                "v:0",
                "-show_entries",
                entries,
                "-of",
                "csv=p=0",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| FFprobeError::Spawn {
                tool: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(FFprobeError::ExitStatus(output.status.code()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn probe_stream(&self, path: &Path) -> Result<VideoStreamInfo, FFprobeError> {
        let stdout = self.query(path, "stream=codec_name,width,height")?;
        parse_stream_csv(&stdout)
    }

    pub fn probe_codec_name(&self, path: &Path) -> Result<String, FFprobeError> {
        let stdout = self.query(path, "stream=codec_name")?;
        parse_codec_csv(&stdout)
    }
}

impl MediaInspector for FfprobeInspector {
    fn detect_codec(&self, path: &Path) -> ProbeOutcome {
        match self.probe_stream(path) {
            Ok(info) => ProbeOutcome::Detected(info),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Codec detection degraded to unknown");
                ProbeOutcome::Unknown(e.to_string())
            }
        }
    }

    fn is_target_codec(&self, path: &Path, target: &str) -> bool {
        match self.probe_codec_name(path) {
            Ok(codec) => codec == target,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Codec check failed, assuming conversion needed");
                false
            }
        }
    }
}

/// Parse `codec,width,height` (first line only). The codec is required;
/// unparseable dimensions are kept as unknown.
pub fn parse_stream_csv(stdout: &str) -> Result<VideoStreamInfo, FFprobeError> {
    let line = first_line(stdout)?;
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return Err(FFprobeError::ParseError(format!(
            "expected codec,width,height but got '{}'",
            line
        )));
    }

    let codec = parts[0];
    if codec.is_empty() {
        return Err(FFprobeError::ParseError("empty codec name".to_string()));
    }

    Ok(VideoStreamInfo {
        codec: codec.to_string(),
        width: parts[1].parse().ok(),
        height: parts[2].parse().ok(),
    })
}

/// Parse the codec-only query. Trailing csv separators are tolerated.
pub fn parse_codec_csv(stdout: &str) -> Result<String, FFprobeError> {
    let line = first_line(stdout)?;
    let codec = line.split(',').next().unwrap_or("").trim();
    if codec.is_empty() {
        return Err(FFprobeError::ParseError("empty codec name".to_string()));
    }
    Ok(codec.to_string())
}

fn first_line(stdout: &str) -> Result<&str, FFprobeError> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| FFprobeError::ParseError("No video stream found".to_string()))
}
