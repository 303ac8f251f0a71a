//! Tagged response values and their little-endian encoding.

use crate::error::WireError;
use crate::MAX_LEN;

const TAG_NIL: u8 = 0;
const TAG_ERR: u8 = 1;
const TAG_STR: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_DBL: u8 = 4;
const TAG_ARR: u8 = 5;

/// Error categories surfaced to clients inside an `ERR` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrCode {
    /// Response body would exceed the frame limit.
    TooBig,
    /// Type mismatch or unparseable argument.
    BadArg,
    /// Command name or arity matched no handler.
    Unknown,
    /// A range query reached past the end of the collection.
    NotFound,
}

impl ErrCode {
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::TooBig => 0,
            Self::BadArg => 1,
            Self::Unknown => 2,
            Self::NotFound => 3,
        }
    }

    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::TooBig),
            1 => Some(Self::BadArg),
            2 => Some(Self::Unknown),
            3 => Some(Self::NotFound),
            _ => None,
        }
    }
}

/// Canonical reply representation produced by command handlers.
///
/// Handlers stay independent from buffer management; encoding into an outgoing
/// connection buffer happens at the reactor boundary via [`encode_response`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Err(ErrCode, String),
    Str(Vec<u8>),
    Int(i64),
    Dbl(f64),
    Arr(Vec<Value>),
}

/// Appends the tagged encoding of `value` to `out`.
pub fn encode_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Nil => out.push(TAG_NIL),
        Value::Err(code, message) => {
            out.push(TAG_ERR);
            out.extend_from_slice(&code.code().to_le_bytes());
            out.extend_from_slice(&(message.len() as u32).to_le_bytes());
            out.extend_from_slice(message.as_bytes());
        }
        Value::Str(bytes) => {
            out.push(TAG_STR);
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            out.extend_from_slice(bytes);
        }
        Value::Int(value) => {
            out.push(TAG_INT);
            out.extend_from_slice(&value.to_le_bytes());
        }
        Value::Dbl(value) => {
            out.push(TAG_DBL);
            out.extend_from_slice(&value.to_le_bytes());
        }
        Value::Arr(items) => {
            out.push(TAG_ARR);
            out.extend_from_slice(&(items.len() as u32).to_le_bytes());
            for item in items {
                encode_value(item, out);
            }
        }
    }
}

/// Appends one framed response (outer length prefix + tagged value) to `out`.
///
/// The 4-byte length hole is reserved up front and patched once the body size is known.
/// A body larger than [`MAX_LEN`] is discarded and replaced with an `ERR TooBig` value,
/// so the frame on the wire always honors the limit.
pub fn encode_response(value: &Value, out: &mut Vec<u8>) {
    let header = out.len();
    out.extend_from_slice(&[0_u8; 4]);
    encode_value(value, out);

    let mut body_len = out.len() - header - 4;
    if body_len > MAX_LEN as usize {
        out.truncate(header + 4);
        encode_value(
            &Value::Err(ErrCode::TooBig, "response is too big".to_owned()),
            out,
        );
        body_len = out.len() - header - 4;
    }
    out[header..header + 4].copy_from_slice(&(body_len as u32).to_le_bytes());
}

/// Decodes one tagged value from the front of `buf`, returning it with the number of
/// bytes consumed.
///
/// # Errors
///
/// Returns `WireError::Truncated` when the buffer ends mid-value, and
/// `WireError::UnknownTag`/`UnknownErrCode` for bytes that cannot belong to a valid
/// response.
pub fn decode_value(buf: &[u8]) -> Result<(Value, usize), WireError> {
    let (&tag, rest) = buf.split_first().ok_or(WireError::Truncated)?;
    match tag {
        TAG_NIL => Ok((Value::Nil, 1)),
        TAG_ERR => {
            let code = read_u32(rest, 0)?;
            let len = read_u32(rest, 4)? as usize;
            let bytes = read_bytes(rest, 8, len)?;
            let code = ErrCode::from_code(code).ok_or(WireError::UnknownErrCode(code))?;
            let message = String::from_utf8_lossy(bytes).into_owned();
            Ok((Value::Err(code, message), 1 + 8 + len))
        }
        TAG_STR => {
            let len = read_u32(rest, 0)? as usize;
            let bytes = read_bytes(rest, 4, len)?;
            Ok((Value::Str(bytes.to_vec()), 1 + 4 + len))
        }
        TAG_INT => {
            let bytes = read_bytes(rest, 0, 8)?;
            let mut raw = [0_u8; 8];
            raw.copy_from_slice(bytes);
            Ok((Value::Int(i64::from_le_bytes(raw)), 1 + 8))
        }
        TAG_DBL => {
            let bytes = read_bytes(rest, 0, 8)?;
            let mut raw = [0_u8; 8];
            raw.copy_from_slice(bytes);
            Ok((Value::Dbl(f64::from_le_bytes(raw)), 1 + 8))
        }
        TAG_ARR => {
            let count = read_u32(rest, 0)?;
            let mut consumed = 1 + 4;
            let mut items = Vec::with_capacity(count.min(MAX_LEN) as usize);
            for _ in 0..count {
                let (item, used) = decode_value(&buf[consumed..])?;
                items.push(item);
                consumed += used;
            }
            Ok((Value::Arr(items), consumed))
        }
        other => Err(WireError::UnknownTag(other)),
    }
}

/// Decodes a complete response body (outer length prefix already stripped).
///
/// # Errors
///
/// Propagates [`decode_value`] failures and rejects bodies with bytes left over after
/// the value.
pub fn decode_response(body: &[u8]) -> Result<Value, WireError> {
    let (value, used) = decode_value(body)?;
    if used != body.len() {
        return Err(WireError::TrailingBytes(body.len() - used));
    }
    Ok(value)
}

fn read_u32(buf: &[u8], at: usize) -> Result<u32, WireError> {
    let bytes = read_bytes(buf, at, 4)?;
    let mut raw = [0_u8; 4];
    raw.copy_from_slice(bytes);
    Ok(u32::from_le_bytes(raw))
}

fn read_bytes(buf: &[u8], at: usize, len: usize) -> Result<&[u8], WireError> {
    let end = at.checked_add(len).ok_or(WireError::Truncated)?;
    buf.get(at..end).ok_or(WireError::Truncated)
}

#[cfg(test)]
mod tests {
    use super::{decode_response, decode_value, encode_response, encode_value, ErrCode, Value};
    use crate::error::WireError;
    use crate::MAX_LEN;
    use googletest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(Value::Nil)]
    #[case(Value::Err(ErrCode::NotFound, "past the end".to_owned()))]
    #[case(Value::Str(b"hello".to_vec()))]
    #[case(Value::Str(Vec::new()))]
    #[case(Value::Int(-40))]
    #[case(Value::Int(i64::MAX))]
    #[case(Value::Dbl(1.5))]
    #[case(Value::Arr(vec![
        Value::Str(b"alice".to_vec()),
        Value::Dbl(2.0),
        Value::Arr(vec![Value::Nil, Value::Int(7)]),
    ]))]
    fn value_encoding_round_trips(#[case] value: Value) {
        let mut encoded = Vec::new();
        encode_value(&value, &mut encoded);
        let (decoded, used) = decode_value(&encoded).expect("encoded value must decode");
        assert_that!(used, eq(encoded.len()));
        assert_that!(&decoded, eq(&value));
    }

    #[rstest]
    fn response_framing_prefixes_body_length() {
        let mut out = Vec::new();
        encode_response(&Value::Str(b"bar".to_vec()), &mut out);
        let body_len = u32::from_le_bytes([out[0], out[1], out[2], out[3]]) as usize;
        assert_that!(body_len, eq(out.len() - 4));
        let decoded = decode_response(&out[4..]).expect("framed body must decode");
        assert_that!(&decoded, eq(&Value::Str(b"bar".to_vec())));
    }

    #[rstest]
    fn oversized_response_collapses_to_too_big_error() {
        let huge = Value::Str(vec![b'x'; MAX_LEN as usize + 1]);
        let mut out = Vec::new();
        encode_response(&huge, &mut out);
        let body_len = u32::from_le_bytes([out[0], out[1], out[2], out[3]]) as usize;
        assert_that!(body_len <= MAX_LEN as usize, eq(true));
        let decoded = decode_response(&out[4..]).expect("substituted body must decode");
        assert_that!(
            matches!(decoded, Value::Err(ErrCode::TooBig, _)),
            eq(true)
        );
    }

    #[rstest]
    fn decode_rejects_trailing_bytes() {
        let mut encoded = Vec::new();
        encode_value(&Value::Int(1), &mut encoded);
        encoded.push(0xFF);
        assert_that!(
            decode_response(&encoded),
            eq(&Err(WireError::TrailingBytes(1)))
        );
    }

    #[rstest]
    fn decode_rejects_truncated_and_unknown_tags() {
        assert_that!(decode_value(&[]), eq(&Err(WireError::Truncated)));
        assert_that!(decode_value(&[2, 9, 0, 0, 0, b'a']), eq(&Err(WireError::Truncated)));
        assert_that!(decode_value(&[42]), eq(&Err(WireError::UnknownTag(42))));
    }
}
