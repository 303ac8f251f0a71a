//! Wire codec for the reef binary protocol.
//!
//! Requests are an outer 4-byte little-endian length prefix followed by a string list
//! (`nstr`, then `nstr` length-prefixed byte strings). Responses are the same outer
//! prefix followed by one tagged value. Byte order is little-endian throughout,
//! irrespective of host.

pub mod error;
pub mod request;
pub mod value;

pub use error::WireError;
pub use request::{encode_request, RequestParser};
pub use value::{decode_response, decode_value, encode_response, encode_value, ErrCode, Value};

/// Upper bound for an outer frame body, the string count of a request, and any single
/// string payload. Frames exceeding it are rejected; responses exceeding it are replaced
/// by an `ErrCode::TooBig` error value.
pub const MAX_LEN: u32 = 16384;
