//! Logging Module
//!
//! Two channels:
//! - [`ActivityLog`]: the human-readable run trail. Every event becomes one
//!   `[YYYY-MM-DD HH:MM:SS] message` line on stdout and in an append-only file.
//! - `tracing` diagnostics: external command lines, exit codes, durations and
//!   warnings, on stderr and optionally a debug file.
//!
//! # Examples
//!
//! ```no_run
//! use shared_utils::logging::{init_logging, ActivityLog, LogConfig};
//!
//! init_logging("vid_h264", LogConfig::default()).expect("Failed to initialize logging");
//!
//! let mut log = ActivityLog::open("conversion.log");
//! log.record("Found 3 video files in /videos");
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ═══════════════════════════════════════════════════════════════
// Diagnostics (tracing)
// ═══════════════════════════════════════════════════════════════

/// Diagnostic logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for this workspace's crates when `RUST_LOG` is unset.
    pub level: Level,
    /// Extra plain-text sink for diagnostics (never rotated).
    pub debug_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            debug_file: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_debug_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.debug_file = Some(path.as_ref().to_path_buf());
        self
    }
}

fn default_filter(program_name: &str, level: Level) -> String {
    format!("{}={},shared_utils={}", program_name, level, level)
}

/// Install the global tracing subscriber. Call once, at startup.
///
/// `RUST_LOG` takes precedence over `config.level`.
pub fn init_logging(program_name: &str, config: LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(program_name, config.level)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(false)
        .boxed();

    let file_layer = match &config.debug_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory: {:?}", dir))?;
            let file_name = path
                .file_name()
                .with_context(|| format!("Debug log path has no file name: {:?}", path))?;
            let appender = tracing_appender::rolling::never(&dir, file_name);
            Some(
                fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        program = program_name,
        level = ?config.level,
        debug_file = ?config.debug_file,
        "Logging system initialized"
    );

    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// ActivityLog
// ═══════════════════════════════════════════════════════════════

/// Format one trail line: `[2024-01-31 09:05:07] message`.
pub fn format_entry(at: &DateTime<Local>, message: &str) -> String {
    format!("[{}] {}", at.format(TIMESTAMP_FORMAT), message)
}

/// Timestamped event trail mirrored to stdout and an append-only file.
///
/// Recording never fails or panics: when either sink cannot be written (a
/// missing directory, a full disk, a closed stdout pipe) a warning is emitted
/// once and that sink is dropped for the rest of the run.
pub struct ActivityLog {
    path: PathBuf,
    file: Option<File>,
    console: Option<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLog")
            .field("path", &self.path)
            .field("file", &self.file.is_some())
            .field("console", &self.console.is_some())
            .finish()
    }
}

impl ActivityLog {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(f) => Some(f),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot open activity log, console only");
                None
            }
        };
        Self {
            path,
            file,
            console: Some(Box::new(std::io::stdout())),
        }
    }

    /// Stop mirroring entries to stdout.
    pub fn without_console(mut self) -> Self {
        self.console = None;
        self
    }

    /// Mirror entries to `writer` instead of stdout.
    pub fn with_console<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.console = Some(Box::new(writer));
        self
    }

    pub fn record<S: AsRef<str>>(&mut self, message: S) {
        let line = format_entry(&Local::now(), message.as_ref());

        if let Some(console) = self.console.as_mut() {
            if let Err(e) = writeln!(console, "{}", line).and_then(|_| console.flush()) {
                tracing::warn!(error = %e, "Console write failed, continuing on activity log file only");
                self.console = None;
            }
        }

        if let Some(file) = self.file.as_mut() {
            if let Err(e) = writeln!(file, "{}", line).and_then(|_| file.flush()) {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Activity log write failed, continuing on console only"
                );
                self.file = None;
            }
        }
    }
}
