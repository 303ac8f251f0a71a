//! Server application: the keyspace and command table behind the reactor.

use reef_common::config::ServerConfig;
use reef_common::error::ReefResult;
use reef_common::telemetry;
use reef_core::dispatch::{CommandRegistry, DispatchState};
use reef_wire::Value;
use tracing::info;

use crate::network::ServerReactor;

/// Single-threaded command execution core.
///
/// The reactor owns exactly one of these; every request from every connection runs to
/// completion here before the next one starts, so command effects on the keyspace are
/// never interleaved.
#[derive(Debug)]
pub struct ServerApp {
    registry: CommandRegistry,
    state: DispatchState,
}

impl ServerApp {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: CommandRegistry::with_builtin_commands(),
            state: DispatchState::default(),
        }
    }

    /// Executes one parsed request and returns its reply value.
    pub fn execute_request(&mut self, strings: Vec<Vec<u8>>) -> Value {
        self.registry.dispatch_request(strings, &mut self.state)
    }

    #[must_use]
    pub fn command_count(&self) -> usize {
        self.registry.len()
    }
}

/// Process bootstrap: logging, keyspace, listener, then the event loop forever.
///
/// # Errors
///
/// Returns an error when logging or the listener cannot be set up, or when the poll
/// loop fails in a non-retryable way.
pub fn run(config: ServerConfig) -> ReefResult<()> {
    telemetry::init_logging(&config)?;
    let mut app = ServerApp::new();
    let mut reactor = ServerReactor::bind(config.listen_addr())?;
    let addr = reactor.local_addr()?;
    info!(%addr, commands = app.command_count(), "reef-server listening");
    reactor.run(&mut app)
}
