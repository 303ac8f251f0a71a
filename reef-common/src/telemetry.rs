//! Sink-pluggable logging bootstrap.
//!
//! The runtime logs through `tracing` macros everywhere; this module decides where the
//! formatted lines go. Sinks are chosen once at startup from [`ServerConfig`] and the
//! subscriber stays installed for the process lifetime.

use std::fs::OpenOptions;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

use crate::config::{LogLevel, LogSink, ServerConfig};
use crate::error::{ReefError, ReefResult};

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Installs the global `tracing` subscriber writing to the configured sinks.
///
/// With no sinks configured this is a no-op and every log statement is dropped at the
/// callsite filter.
///
/// # Errors
///
/// Returns `ReefError::Io` when a file sink cannot be opened for append, and
/// `ReefError::InvalidState` when a global subscriber is already installed.
pub fn init_logging(config: &ServerConfig) -> ReefResult<()> {
    let Some(writer) = build_writer(&config.log_sinks)? else {
        return Ok(());
    };

    tracing_subscriber::fmt()
        .with_max_level(Level::from(config.log_level))
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|_| ReefError::InvalidState("global tracing subscriber already installed"))
}

fn build_writer(sinks: &[LogSink]) -> ReefResult<Option<BoxMakeWriter>> {
    let mut writer: Option<BoxMakeWriter> = None;
    for sink in sinks {
        let next = match sink {
            LogSink::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogSink::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|error| {
                        ReefError::Io(format!("open log file {} failed: {error}", path.display()))
                    })?;
                BoxMakeWriter::new(Arc::new(file))
            }
        };
        writer = Some(match writer {
            None => next,
            Some(current) => BoxMakeWriter::new(current.and(next)),
        });
    }
    Ok(writer)
}
