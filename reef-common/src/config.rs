//! Runtime configuration shared by server bootstrap code.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Minimum severity emitted by the logging layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Destination for formatted log lines.
///
/// The stdout sink is always cheap to keep enabled; the file sink appends line-oriented
/// records to the given path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stdout,
    File(PathBuf),
}

/// Bootstrap configuration used by `reef-server` during process startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listener bind address.
    pub bind_addr: IpAddr,
    /// Listener port.
    pub port: u16,
    /// Log line destinations; empty disables logging entirely.
    pub log_sinks: Vec<LogSink>,
    /// Minimum severity emitted to sinks.
    pub log_level: LogLevel,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 1234,
            log_sinks: vec![LogSink::Stdout],
            log_level: LogLevel::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the socket address the listener binds to.
    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}
