//! Request framing: client-side encoding and the server's streaming parser.

use crate::error::WireError;
use crate::MAX_LEN;

/// Encodes one request frame from its argument strings, appending to `out`.
///
/// # Errors
///
/// Returns `WireError::InvalidLength` when the assembled body would exceed [`MAX_LEN`].
pub fn encode_request<S: AsRef<[u8]>>(args: &[S], out: &mut Vec<u8>) -> Result<(), WireError> {
    let mut body_len = 4_usize;
    for arg in args {
        body_len += 4 + arg.as_ref().len();
    }
    if body_len > MAX_LEN as usize {
        return Err(WireError::InvalidLength(body_len as u32));
    }

    out.extend_from_slice(&(body_len as u32).to_le_bytes());
    out.extend_from_slice(&(args.len() as u32).to_le_bytes());
    for arg in args {
        let arg = arg.as_ref();
        out.extend_from_slice(&(arg.len() as u32).to_le_bytes());
        out.extend_from_slice(arg);
    }
    Ok(())
}

/// Buffered request parser for one connection.
///
/// Socket reads are appended with [`feed_bytes`](Self::feed_bytes); complete pipelined
/// requests are then drained one at a time with [`try_pop_request`](Self::try_pop_request)
/// until it reports that only a partial frame remains.
#[derive(Debug, Default)]
pub struct RequestParser {
    incoming: Vec<u8>,
}

impl RequestParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw socket bytes to the incoming buffer.
    pub fn feed_bytes(&mut self, bytes: &[u8]) {
        self.incoming.extend_from_slice(bytes);
    }

    /// Bytes buffered but not yet consumed by a complete request.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.incoming.len()
    }

    /// Pops the next complete request, if one is fully buffered.
    ///
    /// Returns `Ok(None)` when the buffer holds only a partial frame.
    ///
    /// # Errors
    ///
    /// Any `WireError` means the stream is corrupt; the caller must stop parsing and
    /// close the connection. The buffer is left untouched in that case.
    pub fn try_pop_request(&mut self) -> Result<Option<Vec<Vec<u8>>>, WireError> {
        if self.incoming.len() < 4 {
            return Ok(None);
        }
        let body_len = u32::from_le_bytes([
            self.incoming[0],
            self.incoming[1],
            self.incoming[2],
            self.incoming[3],
        ]);
        if body_len == 0 || body_len > MAX_LEN {
            return Err(WireError::InvalidLength(body_len));
        }
        let frame_len = 4 + body_len as usize;
        if self.incoming.len() < frame_len {
            return Ok(None);
        }

        let args = parse_body(&self.incoming[4..frame_len])?;
        self.incoming.drain(..frame_len);
        Ok(Some(args))
    }
}

fn parse_body(body: &[u8]) -> Result<Vec<Vec<u8>>, WireError> {
    let mut cursor = 0_usize;
    let nstr = read_u32(body, &mut cursor)?;
    if nstr > MAX_LEN {
        return Err(WireError::OversizedCount(nstr));
    }

    let mut args = Vec::with_capacity(nstr as usize);
    while args.len() < nstr as usize {
        let len = read_u32(body, &mut cursor)? as usize;
        let end = cursor.checked_add(len).ok_or(WireError::ShortPayload)?;
        let bytes = body.get(cursor..end).ok_or(WireError::ShortPayload)?;
        args.push(bytes.to_vec());
        cursor = end;
    }

    if cursor != body.len() {
        return Err(WireError::TrailingBytes(body.len() - cursor));
    }
    Ok(args)
}

fn read_u32(body: &[u8], cursor: &mut usize) -> Result<u32, WireError> {
    let end = cursor.checked_add(4).ok_or(WireError::ShortPayload)?;
    let bytes = body.get(*cursor..end).ok_or(WireError::ShortPayload)?;
    let mut raw = [0_u8; 4];
    raw.copy_from_slice(bytes);
    *cursor = end;
    Ok(u32::from_le_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::{encode_request, RequestParser};
    use crate::error::WireError;
    use crate::MAX_LEN;
    use googletest::prelude::*;
    use rstest::rstest;

    fn frame(args: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        encode_request(args, &mut out).expect("test frame must fit the limit");
        out
    }

    #[rstest]
    fn parser_pops_one_complete_request() {
        let mut parser = RequestParser::new();
        parser.feed_bytes(&frame(&[b"set", b"foo", b"bar"]));
        let popped = parser
            .try_pop_request()
            .expect("well-formed frame must parse")
            .expect("complete frame must pop");
        assert_that!(
            &popped,
            eq(&vec![b"set".to_vec(), b"foo".to_vec(), b"bar".to_vec()])
        );
        assert_that!(parser.buffered_len(), eq(0));
    }

    #[rstest]
    fn parser_waits_for_partial_frames_across_feeds() {
        let bytes = frame(&[b"get", b"foo"]);
        let mut parser = RequestParser::new();
        for split in [1_usize, 3, 5, bytes.len() - 1] {
            parser.feed_bytes(&bytes[..split]);
            assert_that!(
                parser.try_pop_request().expect("partial frame is not an error"),
                eq(&None)
            );
            parser.feed_bytes(&bytes[split..]);
            let popped = parser
                .try_pop_request()
                .expect("completed frame must parse")
                .expect("completed frame must pop");
            assert_that!(&popped, eq(&vec![b"get".to_vec(), b"foo".to_vec()]));
        }
    }

    #[rstest]
    fn parser_drains_pipelined_requests_in_order() {
        let mut bytes = frame(&[b"set", b"k1", b"v1"]);
        bytes.extend_from_slice(&frame(&[b"set", b"k2", b"v2"]));
        bytes.extend_from_slice(&frame(&[b"get", b"k1"]));

        let mut parser = RequestParser::new();
        parser.feed_bytes(&bytes);
        let mut names = Vec::new();
        while let Some(args) = parser.try_pop_request().expect("pipeline must parse") {
            names.push(args[1].clone());
        }
        assert_that!(
            &names,
            eq(&vec![b"k1".to_vec(), b"k2".to_vec(), b"k1".to_vec()])
        );
    }

    #[rstest]
    #[case(0_u32)]
    #[case(MAX_LEN + 1)]
    fn parser_rejects_invalid_outer_length(#[case] body_len: u32) {
        let mut parser = RequestParser::new();
        parser.feed_bytes(&body_len.to_le_bytes());
        parser.feed_bytes(&[0_u8; 8]);
        assert_that!(
            parser.try_pop_request(),
            eq(&Err(WireError::InvalidLength(body_len)))
        );
    }

    #[rstest]
    fn parser_rejects_trailing_bytes_in_body() {
        let mut bytes = frame(&[b"keys"]);
        // Grow the declared body by one byte the string list does not cover.
        let body_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) + 1;
        bytes[0..4].copy_from_slice(&body_len.to_le_bytes());
        bytes.push(0xAB);

        let mut parser = RequestParser::new();
        parser.feed_bytes(&bytes);
        assert_that!(
            parser.try_pop_request(),
            eq(&Err(WireError::TrailingBytes(1)))
        );
    }

    #[rstest]
    fn parser_rejects_string_past_body_end() {
        // nstr = 1, declared string length 100, but only 2 bytes of payload follow.
        let body = [1_u32.to_le_bytes(), 100_u32.to_le_bytes()].concat();
        let mut bytes = ((body.len() + 2) as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(&body);
        bytes.extend_from_slice(b"ab");

        let mut parser = RequestParser::new();
        parser.feed_bytes(&bytes);
        assert_that!(parser.try_pop_request(), eq(&Err(WireError::ShortPayload)));
    }

    #[rstest]
    fn encode_rejects_oversized_request() {
        let mut out = Vec::new();
        let huge = vec![b'x'; MAX_LEN as usize];
        assert_that!(
            encode_request(&[huge.as_slice()], &mut out).is_err(),
            eq(true)
        );
        assert_that!(out.is_empty(), eq(true));
    }
}
