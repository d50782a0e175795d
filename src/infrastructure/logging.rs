//! Logging system configuration and initialization
//!
//! This module provides the logging setup for the scraper:
//! - One log file per run, older runs pruned to `max_files`
//! - Configuration file based log level control
//! - Structured JSON logging (optional)
//! - Console and file output support
//! - Log files stored relative to executable location
//! - BRT (Brasília Time) timezone support

#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

// Re-export LoggingConfig from config module
pub use crate::infrastructure::config::LoggingConfig;

/// Prefix of every log file written by the scraper
pub const LOG_FILE_PREFIX: &str = "ml-data-scraper";

/// BRT is UTC-3 all year round
const BRT_OFFSET_SECONDS: i32 = 3 * 3600;

/// Dependency targets kept quiet unless TRACE is requested
const QUIET_TARGETS: &[(&str, &str)] = &[
    ("reqwest", "info"),
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("h2", "warn"),
    ("rustls", "warn"),
    ("cookie_store", "warn"),
    ("html5ever", "warn"),
    ("selectors", "warn"),
    ("tokio", "info"),
];

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(Vec::new());
}

fn brt_offset() -> FixedOffset {
    FixedOffset::west_opt(BRT_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// Custom time formatter for BRT (Brasília Time, UTC-3)
struct BrtTimeFormatter;

impl FormatTime for BrtTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let brt_time = Utc::now().with_timezone(&brt_offset());
        write!(w, "{}", brt_time.format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Per-run log file name, stamped in BRT
pub fn log_file_name(started_at: DateTime<Utc>) -> String {
    let brt = started_at.with_timezone(&brt_offset());
    format!("{}-{}.log", LOG_FILE_PREFIX, brt.format("%Y%m%dT%H%M%S"))
}

/// Filter directives for the configured level.
///
/// Below TRACE the HTTP and HTML parsing dependencies are held back so the
/// scraper's own progress stays readable. `RUST_LOG` overrides all of this.
pub fn filter_directives(level: &str) -> String {
    let level = level.trim().to_lowercase();
    let mut directives = vec![level.clone()];

    if !level.contains("trace") {
        directives.extend(
            QUIET_TARGETS
                .iter()
                .map(|(target, target_level)| format!("{}={}", target, target_level)),
        );
        directives.push(format!("ml_data_scraper_lib={}", level));
        directives.push(format!("ml_data_scraper={}", level));
    }

    directives.join(",")
}

/// Initialize logging with custom configuration
///
/// # Environment Variable Override
/// ```bash
/// # Show detailed HTTP logs
/// RUST_LOG="debug,reqwest=debug,hyper=debug" ml-data-scraper
/// ```
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    let log_dir = get_log_directory();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(&config.level))
            .map_err(|e| anyhow!("Invalid log level {:?}: {}", config.level, e))?,
    };

    let registry = Registry::default().with(env_filter);

    if !config.file_output && !config.console_output {
        return Err(anyhow!("No logging output configured"));
    }

    if config.file_output {
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        // Keep room for the file this run is about to create
        cleanup_old_logs(&log_dir, config.max_files.saturating_sub(1) as usize)?;

        let file_name = log_file_name(Utc::now());
        let file_appender = rolling::never(&log_dir, &file_name);
        let (file_writer, file_guard) = non_blocking(file_appender);

        // Store the guard globally to prevent it from being dropped
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(file_guard);

        if config.json_format {
            let file_layer = fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(BrtTimeFormatter)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false);
            let console = config.console_output.then(|| {
                fmt::Layer::new()
                    .with_writer(std::io::stdout)
                    .with_timer(BrtTimeFormatter)
                    .with_target(false)
            });
            registry.with(file_layer).with(console).try_init()?;
        } else {
            // File layer with minimal formatting (time + level + message only)
            let file_layer = fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(BrtTimeFormatter)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(false);
            let console = config.console_output.then(|| {
                fmt::Layer::new()
                    .with_writer(std::io::stdout)
                    .with_timer(BrtTimeFormatter)
                    .with_target(false)
            });
            registry.with(file_layer).with(console).try_init()?;
        }
    } else {
        // Console only
        let console_layer = fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_timer(BrtTimeFormatter)
            .with_target(false);
        registry.with(console_layer).try_init()?;
    }

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if config.file_output {
        info!("Log directory: {:?}", log_dir);
        info!("JSON format: {}", config.json_format);
        info!("Keeping at most {} log files", config.max_files);
    }

    Ok(())
}

/// Delete the oldest scraper log files so that at most `keep` remain.
///
/// Files not named like a scraper log are left alone.
pub fn cleanup_old_logs(log_dir: &Path, keep: usize) -> Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let mut log_files = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_scraper_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX) && n.ends_with(".log"));

        if path.is_file() && is_scraper_log {
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                log_files.push((path, modified));
            }
        }
    }

    if log_files.len() <= keep {
        return Ok(0);
    }

    // Newest first; ties broken by name, which embeds the start time
    log_files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(keep) {
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove old log file {:?}: {}", path, e),
        }
    }

    Ok(removed)
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== ML Data Scraper System Information ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }

    info!("Log directory: {:?}", get_log_directory());
    info!("==========================================");
}
