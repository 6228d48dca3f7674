//! Batch driver: prepares the run, walks the discovered files through the
//! [`ConversionEngine`] one at a time and tallies the outcomes.

use crate::conversion_api::{ConversionEngine, FileOutcome};
use crate::encoder::VideoEncoder;
use anyhow::{Context, Result};
use shared_utils::batch::{collect_video_files, BatchResult};
use shared_utils::checkpoint::ProgressStore;
use shared_utils::common_utils::ensure_dir_exists;
use shared_utils::conversion_types::ConversionConfig;
use shared_utils::ffprobe::MediaInspector;
use shared_utils::logging::ActivityLog;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Everything a run needs besides the external tools.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub conversion: ConversionConfig,
    pub log_file: PathBuf,
    pub progress_file: PathBuf,
    /// Mirror the activity log to stdout.
    pub console: bool,
}

impl RunConfig {
    pub fn new(conversion: ConversionConfig) -> Self {
        Self {
            conversion,
            log_file: PathBuf::from("conversion.log"),
            progress_file: PathBuf::from("conversion_progress.json"),
            console: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub result: BatchResult,
    /// The run stopped early on user request.
    pub interrupted: bool,
}

/// Run a full batch.
///
/// Errors are fatal conditions only: the destination or archive root cannot
/// be created, the progress store is malformed or cannot be written.
pub fn run_conversion<I, E>(
    config: &RunConfig,
    inspector: I,
    encoder: E,
    interrupt: Arc<AtomicBool>,
) -> Result<RunReport>
where
    I: MediaInspector,
    E: VideoEncoder,
{
    let conv = &config.conversion;
    ensure_dir_exists(&conv.output_dir).context("Cannot prepare destination directory")?;
    ensure_dir_exists(&conv.archive_dir).context("Cannot prepare archive directory")?;

    let store = ProgressStore::load(&config.progress_file)
        .with_context(|| format!("Cannot load progress from {}", config.progress_file.display()))?;
    if store.is_resume_mode() {
        info!(
            completed = store.record().completed.len(),
            failed = store.record().failed.len(),
            "Resuming from previous progress"
        );
    }

    let mut log = ActivityLog::open(&config.log_file);
    if !config.console {
        log = log.without_console();
    }

    let files = collect_video_files(
        &conv.source_dir,
        &[conv.output_dir.clone(), conv.archive_dir.clone()],
    );
    log.record(format!(
        "Found {} video files in {}",
        files.len(),
        conv.source_dir.display()
    ));

    let mut engine = ConversionEngine::new(conv.clone(), inspector, encoder, store, log)
        .with_interrupt_flag(interrupt.clone());

    let start = Instant::now();
    let mut report = RunReport::default();
    let total = files.len();

    for (i, file) in files.iter().enumerate() {
        if interrupt.load(Ordering::SeqCst) {
            report.interrupted = true;
            break;
        }

        let outcome = engine
            .process_file(file, i + 1, total)
            .with_context(|| format!("Aborting run at {}", file.display()))?;

        match outcome {
            FileOutcome::AlreadyProcessed => report.result.already_processed(),
            FileOutcome::AlreadyTargetCodec => report.result.already_target(),
            FileOutcome::OutputExists(_) => report.result.output_exists(),
            FileOutcome::Converted { .. } => report.result.converted(),
            FileOutcome::Failed { reason } => report.result.fail(file.clone(), reason),
            FileOutcome::Interrupted => {
                report.interrupted = true;
                break;
            }
        }
    }

    if report.interrupted {
        engine
            .log_mut()
            .record("Conversion interrupted, progress saved");
    } else {
        engine.log_mut().record("Conversion complete!");
    }

    let r = &report.result;
    for (path, reason) in &r.errors {
        warn!(path = %path.display(), reason = %reason, "Conversion failed");
    }
    info!(
        discovered = total,
        handled = r.total,
        converted = r.converted,
        already_processed = r.already_processed,
        already_target = r.already_target,
        output_exists = r.output_exists,
        failed = r.failed,
        skipped = r.skipped(),
        interrupted = report.interrupted,
        duration_secs = start.elapsed().as_secs_f64(),
        "Batch summary"
    );

    Ok(report)
}
