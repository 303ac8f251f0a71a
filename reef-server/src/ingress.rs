//! Shared connection ingress for the runtime I/O loop and integration-style tests.

use reef_wire::{encode_response, RequestParser, WireError};

use crate::app::ServerApp;

/// Feeds raw socket bytes into one connection parser and executes every request that
/// became complete, appending each framed reply to `outgoing` in arrival order.
///
/// Returns the number of requests executed; pipelined requests inside a single read
/// all execute before control returns to the reactor.
///
/// # Errors
///
/// Returns the framing violation that makes the byte stream unrecoverable. Replies
/// already appended to `outgoing` stay there so the reactor can flush them before
/// closing.
pub(crate) fn ingress_connection_bytes(
    app: &mut ServerApp,
    parser: &mut RequestParser,
    outgoing: &mut Vec<u8>,
    bytes: &[u8],
) -> Result<usize, WireError> {
    parser.feed_bytes(bytes);
    let mut executed = 0;
    while let Some(request) = parser.try_pop_request()? {
        let reply = app.execute_request(request);
        encode_response(&reply, outgoing);
        executed += 1;
    }
    Ok(executed)
}
