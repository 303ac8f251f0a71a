use super::ServerReactor;
use crate::app::ServerApp;
use googletest::prelude::*;
use reef_wire::{decode_response, encode_request, Value};
use rstest::rstest;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

fn bind_reactor() -> (ServerReactor, SocketAddr) {
    let reactor = ServerReactor::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .expect("reactor bind should succeed");
    let addr = reactor.local_addr().expect("local addr should be available");
    (reactor, addr)
}

fn connect(addr: SocketAddr) -> TcpStream {
    let client = TcpStream::connect(addr).expect("connect should succeed");
    client
        .set_nonblocking(true)
        .expect("nonblocking client should be configurable");
    client
}

fn request_bytes(parts: &[&str]) -> Vec<u8> {
    let args: Vec<&[u8]> = parts.iter().map(|part| part.as_bytes()).collect();
    let mut out = Vec::new();
    encode_request(&args, &mut out).expect("test request must fit the frame limit");
    out
}

/// Pumps the reactor while collecting client bytes until `expected` whole response
/// frames arrived or the deadline passes.
fn pump_for_responses(
    reactor: &mut ServerReactor,
    app: &mut ServerApp,
    client: &mut TcpStream,
    expected: usize,
) -> Vec<Value> {
    let deadline = Instant::now() + Duration::from_millis(600);
    let mut buffer = Vec::new();
    let mut responses = Vec::new();
    while Instant::now() < deadline && responses.len() < expected {
        let _ = reactor
            .poll_once(app, Some(Duration::from_millis(5)))
            .expect("reactor poll should succeed");

        let mut chunk = [0_u8; 4096];
        match client.read(&mut chunk) {
            Ok(0) => break,
            Ok(read_len) => buffer.extend_from_slice(&chunk[..read_len]),
            Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(error) => panic!("read from client failed: {error}"),
        }

        while buffer.len() >= 4 {
            let body_len =
                u32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
            if buffer.len() < 4 + body_len {
                break;
            }
            let value =
                decode_response(&buffer[4..4 + body_len]).expect("server frame must decode");
            responses.push(value);
            buffer.drain(..4 + body_len);
        }
    }
    responses
}

#[rstest]
fn reactor_executes_string_commands_end_to_end() {
    let mut app = ServerApp::new();
    let (mut reactor, addr) = bind_reactor();
    let mut client = connect(addr);

    client
        .write_all(&request_bytes(&["set", "foo", "bar"]))
        .expect("write set should succeed");
    let responses = pump_for_responses(&mut reactor, &mut app, &mut client, 1);
    assert_that!(&responses, eq(&vec![Value::Nil]));

    client
        .write_all(&request_bytes(&["get", "foo"]))
        .expect("write get should succeed");
    let responses = pump_for_responses(&mut reactor, &mut app, &mut client, 1);
    assert_that!(&responses, eq(&vec![Value::Str(b"bar".to_vec())]));
}

#[rstest]
fn reactor_preserves_order_across_pipelined_requests() {
    let mut app = ServerApp::new();
    let (mut reactor, addr) = bind_reactor();
    let mut client = connect(addr);

    // Three overwrites of one key in a single TCP write; the previous-value replies
    // prove execution order.
    let mut batch = request_bytes(&["set", "foo", "a"]);
    batch.extend_from_slice(&request_bytes(&["set", "foo", "b"]));
    batch.extend_from_slice(&request_bytes(&["set", "foo", "c"]));
    client.write_all(&batch).expect("pipelined write should succeed");

    let responses = pump_for_responses(&mut reactor, &mut app, &mut client, 3);
    assert_that!(
        &responses,
        eq(&vec![
            Value::Nil,
            Value::Str(b"a".to_vec()),
            Value::Str(b"b".to_vec()),
        ])
    );
}

#[rstest]
fn reactor_serves_sorted_set_queries_over_the_wire() {
    let mut app = ServerApp::new();
    let (mut reactor, addr) = bind_reactor();
    let mut client = connect(addr);

    let mut batch = Vec::new();
    for (score, name) in [("1.0", "a"), ("2.0", "b"), ("2.0", "c"), ("3.0", "d")] {
        batch.extend_from_slice(&request_bytes(&["zadd", "z", score, name]));
    }
    batch.extend_from_slice(&request_bytes(&["zquery", "z", "2.0", "", "0", "10"]));
    client.write_all(&batch).expect("batched write should succeed");

    let responses = pump_for_responses(&mut reactor, &mut app, &mut client, 5);
    assert_that!(responses.len(), eq(5));
    assert_that!(
        &responses[4],
        eq(&Value::Arr(vec![
            Value::Str(b"b".to_vec()),
            Value::Dbl(2.0),
            Value::Str(b"c".to_vec()),
            Value::Dbl(2.0),
            Value::Str(b"d".to_vec()),
            Value::Dbl(3.0),
        ]))
    );
}

#[rstest]
fn reactor_closes_connections_on_invalid_framing() {
    let mut app = ServerApp::new();
    let (mut reactor, addr) = bind_reactor();
    let mut client = connect(addr);

    // A zero outer length can never frame a request.
    client
        .write_all(&0_u32.to_le_bytes())
        .expect("write bad frame should succeed");

    let deadline = Instant::now() + Duration::from_millis(600);
    let mut closed = false;
    while Instant::now() < deadline && !closed {
        let _ = reactor
            .poll_once(&mut app, Some(Duration::from_millis(5)))
            .expect("reactor poll should succeed");
        let mut chunk = [0_u8; 64];
        match client.read(&mut chunk) {
            Ok(0) => closed = true,
            Ok(_) => {}
            Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(_) => closed = true,
        }
    }
    assert_that!(closed, eq(true));
    assert_that!(reactor.connection_count(), eq(0));
}

#[rstest]
fn reactor_isolates_connections_but_shares_the_keyspace() {
    let mut app = ServerApp::new();
    let (mut reactor, addr) = bind_reactor();
    let mut writer = connect(addr);
    let mut reader = connect(addr);

    writer
        .write_all(&request_bytes(&["set", "shared", "value"]))
        .expect("writer set should succeed");
    let responses = pump_for_responses(&mut reactor, &mut app, &mut writer, 1);
    assert_that!(&responses, eq(&vec![Value::Nil]));

    reader
        .write_all(&request_bytes(&["get", "shared"]))
        .expect("reader get should succeed");
    let responses = pump_for_responses(&mut reactor, &mut app, &mut reader, 1);
    assert_that!(&responses, eq(&vec![Value::Str(b"value".to_vec())]));
    assert_that!(reactor.connection_count(), eq(2));
}
