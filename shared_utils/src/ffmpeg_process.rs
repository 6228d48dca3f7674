//! FFmpeg process management - stderr draining and optional timeout
//!
//! FFmpeg writes its progress chatter to stderr. If stderr is piped but never
//! read, the pipe buffer (~64KB) fills, FFmpeg blocks, and the caller waits
//! forever. A dedicated thread keeps draining stderr while the caller waits on
//! the child, so only the tail of the output is retained for diagnostics.
//!
//! ```ignore
//! use shared_utils::ffmpeg_process::FfmpegProcess;
//! use std::process::Command;
//!
//! let mut cmd = Command::new("ffmpeg");
//! cmd.arg("-i").arg("input.mkv").arg("output.mp4");
//!
//! let process = FfmpegProcess::spawn(&mut cmd)?;
//! let finished = process.wait(None)?;
//! ```

use crate::errors::{Result, VidConvertError};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Lines of stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// A completed FFmpeg run.
#[derive(Debug)]
pub struct FinishedProcess {
    pub status: ExitStatus,
    pub stderr_tail: String,
    pub duration: Duration,
}

/// FFmpeg child process with a background stderr consumer.
pub struct FfmpegProcess {
    child: Child,
    stderr_thread: Option<JoinHandle<String>>,
    command: String,
    started: Instant,
}

impl FfmpegProcess {
    /// Spawn with stdin closed, stdout discarded and stderr drained.
    pub fn spawn(cmd: &mut Command) -> Result<Self> {
        let command = format!("{:?}", cmd);
        info!(command = %command, "Executing FFmpeg command");

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn()?;

        let stderr = child.stderr.take().ok_or_else(|| {
            VidConvertError::IoError(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "Failed to capture FFmpeg stderr",
            ))
        })?;

        let stderr_thread = thread::spawn(move || {
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
            for line in BufReader::new(stderr).lines().map_while(std::io::Result::ok) {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            tail.into_iter().collect::<Vec<_>>().join("\n")
        });

        Ok(Self {
            child,
            stderr_thread: Some(stderr_thread),
            command,
            started: Instant::now(),
        })
    }

    /// Wait for the process. With a timeout, the child is killed once it is
    /// exceeded and [`VidConvertError::FFmpegTimeout`] is returned.
    pub fn wait(mut self, timeout: Option<Duration>) -> Result<FinishedProcess> {
        let status = match timeout {
            None => self.child.wait()?,
            Some(limit) => loop {
                if let Some(status) = self.child.try_wait()? {
                    break status;
                }
                if self.started.elapsed() >= limit {
                    error!(command = %self.command, timeout_secs = limit.as_secs_f64(), "FFmpeg timed out, killing");
                    let _ = self.child.kill();
                    let _ = self.child.wait();
                    // grandchildren may still hold the pipe open; do not block on it
                    drop(self.stderr_thread.take());
                    return Err(VidConvertError::FFmpegTimeout(limit));
                }
                thread::sleep(POLL_INTERVAL);
            },
        };

        let stderr_tail = self.join_stderr();
        let duration = self.started.elapsed();

        if status.success() {
            info!(
                exit_code = status.code(),
                duration_secs = duration.as_secs_f64(),
                "FFmpeg process completed successfully"
            );
            debug!(stderr_output = %stderr_tail, "FFmpeg stderr output");
        } else {
            error!(
                command = %self.command,
                exit_code = status.code(),
                duration_secs = duration.as_secs_f64(),
                stderr_output = %stderr_tail,
                "FFmpeg process failed"
            );
        }

        Ok(FinishedProcess {
            status,
            stderr_tail,
            duration,
        })
    }

    fn join_stderr(&mut self) -> String {
        self.stderr_thread
            .take()
            .map(|t| t.join().unwrap_or_default())
            .unwrap_or_default()
    }
}

/// Run to completion and map a non-zero exit into an error.
///
/// A child killed by a signal (no exit code) is reported as
/// [`VidConvertError::FFmpegInterrupted`], which callers use to tell an
/// interrupted run apart from a genuine encoding failure.
pub fn run_ffmpeg(cmd: &mut Command, timeout: Option<Duration>) -> Result<FinishedProcess> {
    let finished = FfmpegProcess::spawn(cmd)?.wait(timeout)?;
    if finished.status.success() {
        return Ok(finished);
    }
    match finished.status.code() {
        Some(code) => Err(VidConvertError::FFmpegError {
            exit_code: code,
            stderr_tail: finished.stderr_tail,
        }),
        None => Err(VidConvertError::FFmpegInterrupted),
    }
}
