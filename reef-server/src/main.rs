//! Binary entrypoint for `reef-server`.

mod app;
mod ingress;
mod network;

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use reef_common::config::{LogLevel, LogSink, ServerConfig};

/// In-memory key/value server speaking the reef binary protocol.
#[derive(Debug, Parser)]
#[command(name = "reef-server", version, about)]
struct Args {
    /// Listener bind address.
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Listener port.
    #[arg(short, long, default_value_t = 1234)]
    port: u16,

    /// Append log lines to this file in addition to stdout.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Suppress stdout logging.
    #[arg(long)]
    quiet: bool,

    /// Emit debug-level logs (rehash activity, per-connection events).
    #[arg(long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let mut log_sinks = Vec::new();
        if !self.quiet {
            log_sinks.push(LogSink::Stdout);
        }
        if let Some(path) = self.log_file {
            log_sinks.push(LogSink::File(path));
        }
        ServerConfig {
            bind_addr: self.bind,
            port: self.port,
            log_sinks,
            log_level: if self.verbose {
                LogLevel::Debug
            } else {
                LogLevel::Info
            },
        }
    }
}

fn main() {
    let config = Args::parse().into_config();
    if let Err(err) = app::run(config) {
        eprintln!("failed to start reef-server: {err}");
        std::process::exit(1);
    }
}
