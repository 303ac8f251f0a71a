//! Reactor-style network event loop.
//!
//! One `mio::Poll` drives everything: the listener plus every accepted connection,
//! single-threaded. Connections live in a dense slot table (the fd-table analog);
//! a connection's slot index is its poll token. Each connection alternates between
//! wanting readability (no reply pending) and writability (reply bytes queued), and
//! error or end-of-stream conditions drain queued output before the socket closes.

use std::io::{Read, Write};
use std::net::SocketAddr;
use std::time::Duration;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use reef_common::error::{ReefError, ReefResult};
use reef_wire::RequestParser;
use tracing::{debug, info, warn};

use crate::app::ServerApp;
use crate::ingress::ingress_connection_bytes;

const LISTENER_TOKEN: Token = Token(usize::MAX);
const READ_CHUNK_BYTES: usize = 32 * 1024;
const MAX_POLL_EVENTS: usize = 256;

/// Where a connection is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionLifecycle {
    /// Reading requests and writing replies.
    Active,
    /// No more input will be processed; flush queued output, then close.
    Draining,
    /// Close as soon as the reactor regains control.
    Closing,
}

#[derive(Debug)]
struct ReactorConnection {
    socket: TcpStream,
    peer: SocketAddr,
    parser: RequestParser,
    outgoing: Vec<u8>,
    lifecycle: ConnectionLifecycle,
    interest: Interest,
}

impl ReactorConnection {
    fn new(socket: TcpStream, peer: SocketAddr) -> Self {
        Self {
            socket,
            peer,
            parser: RequestParser::new(),
            outgoing: Vec::new(),
            lifecycle: ConnectionLifecycle::Active,
            interest: Interest::READABLE,
        }
    }

    fn mark_draining(&mut self) {
        if self.lifecycle == ConnectionLifecycle::Active {
            self.lifecycle = ConnectionLifecycle::Draining;
        }
    }

    fn mark_closing(&mut self) {
        self.lifecycle = ConnectionLifecycle::Closing;
    }

    fn can_read(&self) -> bool {
        self.lifecycle == ConnectionLifecycle::Active
    }

    fn should_close_now(&self) -> bool {
        self.lifecycle == ConnectionLifecycle::Closing
            || (self.lifecycle == ConnectionLifecycle::Draining && self.outgoing.is_empty())
    }

    /// Strict read/write alternation: queued reply bytes suspend reading until the
    /// socket drains them.
    fn desired_interest(&self) -> Interest {
        if self.outgoing.is_empty() {
            Interest::READABLE
        } else {
            Interest::WRITABLE
        }
    }
}

/// One reactor instance managing the listener and all accepted connections.
#[derive(Debug)]
pub struct ServerReactor {
    poll: Poll,
    events: Events,
    ready_events: Vec<(Token, bool, bool, bool)>,
    listener: TcpListener,
    connections: Vec<Option<ReactorConnection>>,
}

impl ServerReactor {
    /// Binds the listener and registers it in the reactor poller.
    ///
    /// # Errors
    ///
    /// Returns `ReefError::Io` if the listener bind or poll registration fails.
    pub fn bind(addr: SocketAddr) -> ReefResult<Self> {
        let poll =
            Poll::new().map_err(|error| ReefError::Io(format!("create poll failed: {error}")))?;
        let mut listener = TcpListener::bind(addr)
            .map_err(|error| ReefError::Io(format!("bind listener failed: {error}")))?;
        poll.registry()
            .register(&mut listener, LISTENER_TOKEN, Interest::READABLE)
            .map_err(|error| {
                ReefError::Io(format!("register listener in poll failed: {error}"))
            })?;

        Ok(Self {
            poll,
            events: Events::with_capacity(MAX_POLL_EVENTS),
            ready_events: Vec::with_capacity(MAX_POLL_EVENTS),
            listener,
            connections: Vec::new(),
        })
    }

    pub fn local_addr(&self) -> ReefResult<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|error| ReefError::Io(format!("query local address failed: {error}")))
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.iter().filter(|slot| slot.is_some()).count()
    }

    /// Runs the event loop forever.
    ///
    /// # Errors
    ///
    /// Returns `ReefError::Io` on non-retryable poll failures.
    pub fn run(&mut self, app: &mut ServerApp) -> ReefResult<()> {
        loop {
            self.poll_once(app, None)?;
        }
    }

    /// Processes one readiness cycle: accept, read+execute, write, close.
    ///
    /// # Errors
    ///
    /// Returns `ReefError::Io` when polling fails for any reason other than an
    /// interrupted syscall, which is retried on the next cycle.
    pub fn poll_once(&mut self, app: &mut ServerApp, timeout: Option<Duration>) -> ReefResult<usize> {
        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::Interrupted => return Ok(0),
            Err(error) => return Err(ReefError::Io(format!("poll wait failed: {error}"))),
        }

        self.ready_events.clear();
        for event in &self.events {
            self.ready_events.push((
                event.token(),
                event.is_readable(),
                event.is_writable(),
                event.is_read_closed() || event.is_write_closed() || event.is_error(),
            ));
        }

        let ready_count = self.ready_events.len();
        for index in 0..ready_count {
            let (token, readable, writable, closed_or_error) = self.ready_events[index];
            if token == LISTENER_TOKEN {
                self.accept_new_connections();
                continue;
            }
            self.handle_connection_event(app, token, readable, writable, closed_or_error);
        }
        Ok(ready_count)
    }

    /// Accept failures are logged and skipped; they never take the loop down.
    fn accept_new_connections(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((mut socket, peer)) => {
                    let slot = self.allocate_slot();
                    let token = Token(slot);
                    if let Err(error) =
                        self.poll
                            .registry()
                            .register(&mut socket, token, Interest::READABLE)
                    {
                        warn!(%peer, %error, "register accepted connection failed");
                        continue;
                    }
                    let _ = socket.set_nodelay(true);
                    info!(%peer, token = slot, "new client");
                    self.connections[slot] = Some(ReactorConnection::new(socket, peer));
                }
                Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => return,
                Err(error) => {
                    warn!(%error, "failed to accept a connection");
                    return;
                }
            }
        }
    }

    /// Smallest vacant slot, mirroring how the kernel hands out file descriptors.
    fn allocate_slot(&mut self) -> usize {
        match self.connections.iter().position(Option::is_none) {
            Some(slot) => slot,
            None => {
                self.connections.push(None);
                self.connections.len() - 1
            }
        }
    }

    fn handle_connection_event(
        &mut self,
        app: &mut ServerApp,
        token: Token,
        readable: bool,
        writable: bool,
        closed_or_error: bool,
    ) {
        let Some(mut connection) = self.connections.get_mut(token.0).and_then(Option::take)
        else {
            return;
        };

        if closed_or_error {
            connection.mark_draining();
        }
        if readable && connection.can_read() {
            Self::read_connection_bytes(app, &mut connection);
        }
        if writable && !connection.outgoing.is_empty() {
            Self::flush_connection_writes(&mut connection);
        }

        if connection.should_close_now() {
            self.close_connection(connection);
            return;
        }
        self.refresh_connection_interest(token, &mut connection);
        if connection.should_close_now() {
            self.close_connection(connection);
            return;
        }
        self.connections[token.0] = Some(connection);
    }

    fn read_connection_bytes(app: &mut ServerApp, connection: &mut ReactorConnection) {
        let mut chunk = [0_u8; READ_CHUNK_BYTES];
        loop {
            match connection.socket.read(&mut chunk) {
                Ok(0) => {
                    connection.mark_draining();
                    return;
                }
                Ok(read_len) => {
                    match ingress_connection_bytes(
                        app,
                        &mut connection.parser,
                        &mut connection.outgoing,
                        &chunk[..read_len],
                    ) {
                        Ok(_) => {}
                        Err(error) => {
                            // Framing violations are fatal to the connection: flush
                            // what was already produced, then close.
                            debug!(peer = %connection.peer, %error, "protocol error");
                            connection.mark_draining();
                            return;
                        }
                    }
                }
                Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => return,
                Err(_error) => {
                    connection.mark_closing();
                    return;
                }
            }
        }
    }

    fn flush_connection_writes(connection: &mut ReactorConnection) {
        while !connection.outgoing.is_empty() {
            match connection.socket.write(connection.outgoing.as_slice()) {
                Ok(0) => {
                    connection.mark_closing();
                    return;
                }
                Ok(written) => {
                    let _ = connection.outgoing.drain(..written);
                }
                Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => return,
                Err(_error) => {
                    connection.mark_closing();
                    return;
                }
            }
        }
    }

    fn refresh_connection_interest(&self, token: Token, connection: &mut ReactorConnection) {
        let next_interest = connection.desired_interest();
        if next_interest == connection.interest {
            return;
        }
        match self
            .poll
            .registry()
            .reregister(&mut connection.socket, token, next_interest)
        {
            Ok(()) => connection.interest = next_interest,
            Err(error) => {
                warn!(peer = %connection.peer, %error, "refresh poll interest failed");
                connection.mark_closing();
            }
        }
    }

    fn close_connection(&self, mut connection: ReactorConnection) {
        if let Err(error) = self.poll.registry().deregister(&mut connection.socket) {
            warn!(peer = %connection.peer, %error, "deregister closed connection failed");
        }
        info!(peer = %connection.peer, "closing connection");
    }
}

#[cfg(test)]
#[path = "network/tests.rs"]
mod tests;
