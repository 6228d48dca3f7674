//! Video Conversion API Module - H.264 Version
//!
//! Per-file lifecycle of a batch: probe -> convert -> archive -> record.
//!
//! Every file ends in exactly one [`FileOutcome`]. All outcomes except
//! `OutputExists`, `Interrupted` and a rejected non-UTF-8 path are persisted
//! to the progress store before the next file starts. Per-file problems never abort the batch; only a
//! progress store that cannot be written is returned as an error.

use crate::encoder::VideoEncoder;
use shared_utils::checkpoint::ProgressStore;
use shared_utils::common_utils::{
    archive_path_for, ensure_dir_exists, move_file, output_path_for, partial_path_for,
};
use shared_utils::conversion_types::{ConversionConfig, OUTPUT_EXTENSION};
use shared_utils::ffprobe::MediaInspector;
use shared_utils::logging::ActivityLog;
use shared_utils::types::{FileSize, SizeDelta};
use shared_utils::{Result, VidConvertError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Terminal state of one file within a run.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Listed in the progress store by an earlier run.
    AlreadyProcessed,
    /// Already in the target codec; recorded as completed.
    AlreadyTargetCodec,
    /// Something already sits at the output path. Not recorded.
    OutputExists(PathBuf),
    Converted {
        output: PathBuf,
        archived: PathBuf,
        delta: SizeDelta,
    },
    /// Recorded as failed, except for paths that are not valid UTF-8: those
    /// cannot be stored as distinct progress keys and are left unrecorded.
    Failed { reason: String },
    /// Stopped by the user mid-file. Not recorded; redone next run.
    Interrupted,
}

/// Drives the per-file state machine against a progress store and activity log.
pub struct ConversionEngine<I: MediaInspector, E: VideoEncoder> {
    config: ConversionConfig,
    inspector: I,
    encoder: E,
    store: ProgressStore,
    log: ActivityLog,
    interrupt: Option<Arc<AtomicBool>>,
}

impl<I: MediaInspector, E: VideoEncoder> ConversionEngine<I, E> {
    pub fn new(
        config: ConversionConfig,
        inspector: I,
        encoder: E,
        store: ProgressStore,
        log: ActivityLog,
    ) -> Self {
        Self {
            config,
            inspector,
            encoder,
            store,
            log,
            interrupt: None,
        }
    }

    /// Flag set asynchronously (Ctrl-C) to request a stop.
    pub fn with_interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .map(|f| f.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn log_mut(&mut self) -> &mut ActivityLog {
        &mut self.log
    }

    /// Take `input` (the `index`-th of `total`, 1-based) through its lifecycle.
    pub fn process_file(&mut self, input: &Path, index: usize, total: usize) -> Result<FileOutcome> {
        let name = display_name(input);
        let Some(key) = input.to_str().map(str::to_owned) else {
            let reason = format!("Path is not valid UTF-8: {}", input.display());
            self.log
                .record(format!("[{}/{}] Skipping: {}", index, total, reason));
            return Ok(FileOutcome::Failed { reason });
        };

        if self.store.is_processed(&key) {
            self.log
                .record(format!("[{}/{}] Already processed, skipping: {}", index, total, name));
            return Ok(FileOutcome::AlreadyProcessed);
        }

        self.log
            .record(format!("[{}/{}] Processing: {}", index, total, name));

        let probe = self.inspector.detect_codec(input);
        let codec = probe.codec_label().to_string();
        let resolution = probe.resolution_label();
        self.log
            .record(format!("  Detected: {} codec at {}", codec, resolution));

        let original_size = match fs::metadata(input) {
            Ok(meta) => FileSize::new(meta.len()),
            Err(e) => return self.fail(&key, format!("Cannot read file size: {}", e)),
        };
        self.log
            .record(format!("  Original size: {}", original_size));

        if self.inspector.is_target_codec(input, &self.config.target_codec) {
            self.log
                .record(format!("  Already {}, skipping", self.config.target_codec));
            self.store.mark_completed(&key)?;
            return Ok(FileOutcome::AlreadyTargetCodec);
        }

        let output = output_path_for(
            input,
            &self.config.source_dir,
            &self.config.output_dir,
            OUTPUT_EXTENSION,
        );
        if let Some(parent) = output.parent() {
            if let Err(e) = ensure_dir_exists(parent) {
                return self.fail(&key, format!("Cannot create output directory: {}", e));
            }
        }

        if output.exists() {
            self.log
                .record(format!("  Output exists, skipping: {}", display_name(&output)));
            return Ok(FileOutcome::OutputExists(output));
        }

        if self.is_interrupted() {
            self.log
                .record(format!("  Interrupted, will retry next run: {}", name));
            return Ok(FileOutcome::Interrupted);
        }

        self.log.record(format!(
            "  Converting {} -> {}/MP4 at {}",
            codec, self.config.target_codec, resolution
        ));
        self.log.record(format!("  Output: {}", output.display()));

        let partial = partial_path_for(&output);
        if let Err(e) = self.encoder.encode(input, &partial) {
            remove_partial(&partial);
            if self.is_interrupted() {
                self.log
                    .record(format!("  Interrupted, will retry next run: {}", name));
                return Ok(FileOutcome::Interrupted);
            }
            self.log.record("  Conversion failed!");
            return self.fail(&key, describe_encoder_error(&e));
        }

        if let Err(e) = fs::rename(&partial, &output) {
            remove_partial(&partial);
            return self.fail(&key, format!("Cannot finalize output: {}", e));
        }

        self.log.record("  Conversion successful!");

        let new_size = match fs::metadata(&output) {
            Ok(meta) => FileSize::new(meta.len()),
            Err(e) => return self.fail(&key, format!("Cannot read output size: {}", e)),
        };
        let delta = new_size.delta_from(original_size);
        self.log.record(format!("  New size: {}", new_size));
        self.log.record(format!("  Size difference: {}", delta));

        let archived = archive_path_for(input, &self.config.archive_dir);
        if let Err(e) = move_file(input, &archived) {
            return self.fail(&key, format!("Cannot archive original: {}", e));
        }
        self.log
            .record(format!("  Original moved to: {}", archived.display()));

        self.store.mark_completed(&key)?;
        Ok(FileOutcome::Converted {
            output,
            archived,
            delta,
        })
    }

    fn fail(&mut self, key: &str, reason: String) -> Result<FileOutcome> {
        self.log.record(format!("  {}", reason));
        self.store.mark_failed(key)?;
        Ok(FileOutcome::Failed { reason })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn describe_encoder_error(e: &VidConvertError) -> String {
    match e {
        VidConvertError::FFmpegError {
            exit_code,
            stderr_tail,
        } => {
            let last = stderr_tail.lines().last().unwrap_or("").trim();
            if last.is_empty() {
                format!("Encoder exited with status {}", exit_code)
            } else {
                format!("Encoder exited with status {}: {}", exit_code, last)
            }
        }
        other => other.to_string(),
    }
}

fn remove_partial(partial: &Path) {
    match fs::remove_file(partial) {
        Ok(()) => debug!(path = %partial.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %partial.display(), error = %e, "Cannot remove partial output"),
    }
}
