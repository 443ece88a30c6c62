//! Log output for the daemon.
//!
//! Events go to stdout and, when configured, are appended to a log file.
//! The file and the level are replaced together on every reload; the
//! previous file handle is closed once it has been swapped out.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use pushmon_core::LoggingConfig;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, reload};

/// Fan-out writer target: stdout plus the current log file, if any.
#[derive(Clone, Default)]
pub struct LogSink {
    file: Arc<Mutex<Option<File>>>,
}

impl LogSink {
    /// Swap in a new log file, returning the one it replaces.
    pub fn replace(&self, file: Option<File>) -> Option<File> {
        let mut current = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, file)
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter {
            file: Arc::clone(&self.file),
        }
    }
}

pub struct SinkWriter {
    file: Arc<Mutex<Option<File>>>,
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        fan_out(&mut io::stdout().lock(), file.as_mut(), |w| w.write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        fan_out(&mut io::stdout().lock(), file.as_mut(), |w| w.flush())
    }
}

/// Run `op` against stdout and then the file, even if stdout fails.
/// Returns the first error.
fn fan_out(
    stdout: &mut dyn Write,
    file: Option<&mut File>,
    mut op: impl FnMut(&mut dyn Write) -> io::Result<()>,
) -> io::Result<()> {
    let first = op(stdout);
    let second = match file {
        Some(file) => op(file),
        None => Ok(()),
    };
    first.and(second)
}

/// Handle to the installed subscriber's level and destination.
pub struct Logging {
    filter: reload::Handle<EnvFilter, Registry>,
    sink: LogSink,
}

impl Logging {
    /// Install the global subscriber: stdout only, level `info`.
    pub fn init() -> anyhow::Result<Self> {
        let (filter, handle) = reload::Layer::new(EnvFilter::new("info"));
        let sink = LogSink::default();

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(sink.clone()),
            )
            .try_init()
            .context("failed to install log subscriber")?;

        Ok(Self {
            filter: handle,
            sink,
        })
    }

    /// Reopen the log file and set the level from `config`.
    ///
    /// A log file that cannot be opened is an error and leaves the current
    /// destination untouched. `RUST_LOG`, when set, takes precedence over
    /// the configured level.
    pub fn apply(&self, config: &LoggingConfig) -> anyhow::Result<()> {
        let file = match &config.file {
            Some(path) => {
                info!(path = %path.display(), "setting up log file");
                Some(open_log_file(path)?)
            }
            None => None,
        };

        let level = parse_level(&config.level).unwrap_or_else(|| {
            warn!(level = %config.level, "invalid log level, using info");
            LevelFilter::INFO
        });
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

        drop(self.sink.replace(file));
        self.filter
            .reload(filter)
            .context("failed to reload log level")?;

        debug!(%level, "logging setup completed");
        Ok(())
    }
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("error opening log file {}", path.display()))
}

/// Parse a configured level name, case-insensitively.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" => Some(LevelFilter::WARN),
        "error" => Some(LevelFilter::ERROR),
        _ => None,
    }
}
