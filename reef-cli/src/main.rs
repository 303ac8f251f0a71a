//! reef-cli: blocking demonstration client.
//!
//! Takes one command as positional strings, sends it as a single request frame, and
//! pretty-prints the decoded response. Exits nonzero on any protocol or I/O failure.

mod format;

use std::io::{Read, Write};
use std::net::TcpStream;
use std::process::ExitCode;

use clap::Parser;
use reef_wire::{decode_response, encode_request, MAX_LEN};

/// Command-line client for reef-server.
#[derive(Debug, Parser)]
#[command(name = "reef-cli", version, about)]
struct Args {
    /// Server hostname.
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port.
    #[arg(short, long, default_value_t = 1234)]
    port: u16,

    /// The request strings, e.g. `set foo bar` or `zquery s 0 "" 0 10`.
    #[arg(required = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("reef-cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<String, String> {
    let mut frame = Vec::new();
    encode_request(&args.command, &mut frame)
        .map_err(|error| format!("encode request failed: {error}"))?;

    let mut stream = TcpStream::connect((args.host.as_str(), args.port))
        .map_err(|error| format!("connect to {}:{} failed: {error}", args.host, args.port))?;
    stream
        .write_all(&frame)
        .map_err(|error| format!("send request failed: {error}"))?;

    let mut header = [0_u8; 4];
    stream
        .read_exact(&mut header)
        .map_err(|error| format!("read response header failed: {error}"))?;
    let body_len = u32::from_le_bytes(header);
    if body_len > MAX_LEN {
        return Err(format!("response length {body_len} exceeds the frame limit"));
    }

    let mut body = vec![0_u8; body_len as usize];
    stream
        .read_exact(&mut body)
        .map_err(|error| format!("read response body failed: {error}"))?;
    let value = decode_response(&body).map_err(|error| format!("decode response failed: {error}"))?;
    Ok(format::render(&value))
}
