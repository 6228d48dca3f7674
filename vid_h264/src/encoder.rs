//! H.264 encoding via FFmpeg.

use shared_utils::conversion_types::{EncoderSettings, VIDEO_ENCODER};
use shared_utils::ffmpeg_process::run_ffmpeg;
use shared_utils::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

/// Encoding seam used by the conversion engine.
pub trait VideoEncoder {
    /// Encode `input` into `output`. `Ok` only when the encoder reported success.
    fn encode(&self, input: &Path, output: &Path) -> Result<()>;
}

/// libx264 encoder: video re-encoded, audio and subtitles copied, every
/// stream mapped, MP4 container forced.
#[derive(Debug, Clone)]
pub struct FfmpegH264Encoder {
    program: PathBuf,
    settings: EncoderSettings,
}

impl FfmpegH264Encoder {
    pub fn new(program: impl Into<PathBuf>, settings: EncoderSettings) -> Self {
        Self {
            program: program.into(),
            settings,
        }
    }

    /// Arguments after the program name. The container is forced so outputs
    /// written under a temporary name are still MP4.
    pub fn build_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let crf = self.settings.crf.to_string();
        let mut args: Vec<OsString> = vec!["-nostdin".into(), "-i".into(), input.into()];
        args.extend(
            [
                "-c:v",
                VIDEO_ENCODER,
                "-crf",
                crf.as_str(),
                "-preset",
                self.settings.preset.as_str(),
                "-c:a",
                "copy",
                "-c:s",
                "copy",
                "-map",
                "0",
                "-f",
                "mp4",
                "-y",
            ]
            .iter()
            .map(OsString::from),
        );
        args.push(output.into());
        args
    }
}

impl Default for FfmpegH264Encoder {
    fn default() -> Self {
        Self::new("ffmpeg", EncoderSettings::default())
    }
}

impl VideoEncoder for FfmpegH264Encoder {
    fn encode(&self, input: &Path, output: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.build_args(input, output));

        let finished = run_ffmpeg(&mut cmd, self.settings.timeout)?;
        info!(
            input = %input.display(),
            duration_secs = finished.duration.as_secs_f64(),
            "H.264 encode finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_as_strings(encoder: &FfmpegH264Encoder) -> Vec<String> {
        encoder
            .build_args(Path::new("/in/a.mkv"), Path::new("/out/.a.mp4.part"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_default_command_line() {
        let args = args_as_strings(&FfmpegH264Encoder::default());
        assert_eq!(
            args,
            vec![
                "-nostdin", "-i", "/in/a.mkv", "-c:v", "libx264", "-crf", "18", "-preset",
                "faster", "-c:a", "copy", "-c:s", "copy", "-map", "0", "-f", "mp4", "-y",
                "/out/.a.mp4.part",
            ]
        );
    }

    #[test]
    fn test_custom_quality_settings() {
        let encoder = FfmpegH264Encoder::new(
            "ffmpeg",
            EncoderSettings::default().with_crf(23).with_preset("slow"),
        );
        let args = args_as_strings(&encoder);
        let crf = args.iter().position(|a| a == "-crf").unwrap();
        assert_eq!(args[crf + 1], "23");
        let preset = args.iter().position(|a| a == "-preset").unwrap();
        assert_eq!(args[preset + 1], "slow");
        assert_eq!(args.last().unwrap(), "/out/.a.mp4.part");
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_program_is_error() {
        let encoder = FfmpegH264Encoder::new("ffmpeg-not-installed-xyz", EncoderSettings::default());
        assert!(encoder
            .encode(Path::new("/in/a.mkv"), Path::new("/tmp/none.mp4"))
            .is_err());
    }
}
