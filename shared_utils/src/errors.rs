use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidConvertError {
    #[error("FFmpeg exited with status {exit_code}: {stderr_tail}")]
    FFmpegError {
        exit_code: i32,
        stderr_tail: String,
    },

    #[error("FFmpeg timed out after {0:?}")]
    FFmpegTimeout(Duration),

    #[error("FFmpeg was terminated by a signal (interrupted)")]
    FFmpegInterrupted,

    #[error("Progress file is malformed: {path}: {source}")]
    MalformedProgress {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write progress file {path}: {source}")]
    ProgressWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl VidConvertError {
    /// Errors that void the checkpoint guarantee or the run setup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VidConvertError::MalformedProgress { .. }
                | VidConvertError::ProgressWrite { .. }
                | VidConvertError::CreateDir { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, VidConvertError>;
