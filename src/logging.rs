//! Log file output via `tracing` and `tracing-subscriber`.
//!
//! The terminal belongs to the UI, so events are written to a file
//! (by default `albumgrid.log` in the cache directory). Logging is off
//! unless a level is given on the command line or in the config file.
//! `RUST_LOG` overrides the configured level.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::cache::{CacheManager, LOG_FILE};
use crate::config::LoggingConfig;
use albumgrid_cli::{Args, LogLevel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LogLevel,
    pub log_file: PathBuf,
}

impl LogConfig {
    /// Settings from CLI flags over the config file. `None` when logging is off.
    pub fn resolve(args: &Args, config: &LoggingConfig, cache: &CacheManager) -> Option<Self> {
        let level = args.log_level.or_else(|| config.log_level())?;
        let log_file = args
            .log_file
            .clone()
            .or_else(|| config.file.clone())
            .unwrap_or_else(|| cache.cache_file(LOG_FILE));
        Some(Self { level, log_file })
    }
}

/// Install the global subscriber writing to `config.log_file`.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    if let Some(parent) = config.log_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .map_err(|e| eyre!("Failed to open log file {}: {}", config.log_file.display(), e))?;

    let layer = fmt::layer()
        .with_writer(SharedFileWriter::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(layer)
        .try_init()
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))
}

fn build_env_filter(level: LogLevel) -> EnvFilter {
    // dependencies stay at warn
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,albumgrid={level}", level = level.as_str()))
    })
}

#[derive(Clone)]
struct SharedFileWriter {
    file: Arc<Mutex<std::fs::File>>,
}

impl SharedFileWriter {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }
}

struct SharedFileGuard {
    file: Arc<Mutex<std::fs::File>>,
}

impl Write for SharedFileGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.flush()
    }
}

impl<'a> MakeWriter<'a> for SharedFileWriter {
    type Writer = SharedFileGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileGuard {
            file: Arc::clone(&self.file),
        }
    }
}
