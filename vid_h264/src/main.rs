use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn, Level};

use shared_utils::conversion_types::{EncoderSettings, DEFAULT_CRF, DEFAULT_PRESET, X264_PRESETS};
use shared_utils::logging::{init_logging, LogConfig};
use shared_utils::{ConversionConfig, FfprobeInspector};
use vid_h264::{run_conversion, FfmpegH264Encoder, RunConfig};

/// Exit status after Ctrl-C, as shells report SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(name = "vid-h264")]
#[command(version, about = "Resumable batch converter: re-encodes videos to H.264 MP4 and archives the originals", long_about = None)]
struct Cli {
    /// Directory scanned recursively for videos
    #[arg(short, long)]
    source: PathBuf,

    /// Root for converted files (source layout is mirrored)
    #[arg(short, long)]
    destination: PathBuf,

    /// Directory receiving the originals after conversion
    #[arg(short, long)]
    archive: PathBuf,

    /// Activity log file (appended)
    #[arg(short, long, default_value = "conversion.log")]
    log: PathBuf,

    /// Progress file used to resume interrupted runs
    #[arg(short, long, default_value = "conversion_progress.json")]
    progress: PathBuf,

    /// x264 constant rate factor
    #[arg(long, default_value_t = DEFAULT_CRF, value_parser = clap::value_parser!(u8).range(0..=51))]
    crf: u8,

    /// x264 preset
    #[arg(long, default_value = DEFAULT_PRESET, value_parser = clap::builder::PossibleValuesParser::new(X264_PRESETS))]
    preset: String,

    /// Kill an encode that runs longer than this many seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// FFmpeg executable
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// FFprobe executable
    #[arg(long, default_value = "ffprobe")]
    ffprobe: PathBuf,

    /// Debug-level diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Also write diagnostics to this file
    #[arg(long, value_name = "FILE")]
    debug_log: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_config =
        LogConfig::new().with_level(if cli.verbose { Level::DEBUG } else { Level::WARN });
    if let Some(path) = &cli.debug_log {
        log_config = log_config.with_debug_file(path);
    }
    init_logging("vid_h264", log_config)?;

    for tool in [&cli.ffmpeg, &cli.ffprobe] {
        match which::which(tool) {
            Ok(resolved) => debug!(tool = %tool.display(), path = %resolved.display(), "Tool found"),
            Err(e) => warn!(tool = %tool.display(), error = %e, "Tool not found, affected steps will fail per file"),
        }
    }

    let interrupt = Arc::new(AtomicBool::new(false));
    {
        let flag = interrupt.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .context("Failed to install Ctrl-C handler")?;
    }

    let mut config = RunConfig::new(ConversionConfig::new(
        &cli.source,
        &cli.destination,
        &cli.archive,
    ));
    config.log_file = cli.log;
    config.progress_file = cli.progress;

    let settings = EncoderSettings::default()
        .with_crf(cli.crf)
        .with_preset(cli.preset)
        .with_timeout(cli.timeout.map(Duration::from_secs));

    let report = run_conversion(
        &config,
        FfprobeInspector::new(cli.ffprobe),
        FfmpegH264Encoder::new(cli.ffmpeg, settings),
        interrupt,
    )?;

    if report.interrupted {
        std::process::exit(EXIT_INTERRUPTED);
    }
    Ok(())
}
