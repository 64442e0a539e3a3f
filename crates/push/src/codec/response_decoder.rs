//! Incremental decoder for HTTP response heads.
//!
//! Parses the status line and header block out of whatever byte fragments
//! the socket delivers, using `httparse` for the grammar. The decoder only
//! consumes bytes once the complete head (through the terminating blank
//! line) is available; everything after the blank line is left in the
//! buffer for the body stage, so no byte is lost across the handoff.
//!
//! The status line must carry all three parts: version, status code, and
//! a non-empty reason phrase. A line missing its reason phrase is
//! rejected. Head lines are otherwise scanned as `httparse` does, which
//! tolerates a bare LF terminator; CRLF remains the canonical form.
//!
//! Each call re-parses the accumulated head bytes from the start rather
//! than resuming mid-line. Heads are small and capped, so the bounded
//! re-scan is the simpler trade.
//!
//! Body-kind dispatch happens here too: `Content-Length` is checked first
//! and wins, otherwise a present `Transfer-Encoding` selects chunked
//! decoding. A response with neither header is rejected, since the
//! transport cannot tell where such a body would end.

use bytes::{Buf, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use httparse::Status;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{ParseError, PayloadSize, ResponseHead};

/// Maximum number of headers accepted in a response
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes accepted for the entire head
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decoder for HTTP response heads implementing the [`Decoder`] trait.
///
/// Produces the parsed [`ResponseHead`] together with the [`PayloadSize`]
/// chosen from its headers. Stateless: partial input simply yields
/// `Ok(None)` and the accumulated buffer is re-examined on the next call.
#[derive(Debug)]
pub struct ResponseDecoder;

impl Decoder for ResponseDecoder {
    type Item = (ResponseHead, PayloadSize);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let (head, head_end) = {
            let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
            let mut response = httparse::Response::new(&mut headers);

            let parsed = response.parse(src).map_err(|e| match e {
                httparse::Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
                httparse::Error::Status | httparse::Error::Version => ParseError::invalid_status_line(e),
                e => ParseError::invalid_header(e),
            })?;

            let head_end = match parsed {
                Status::Complete(head_end) => head_end,
                Status::Partial => {
                    ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                    return Ok(None);
                }
            };

            ensure!(head_end <= MAX_HEADER_BYTES, ParseError::too_large_header(head_end, MAX_HEADER_BYTES));

            let code = response.code.ok_or_else(|| ParseError::invalid_status_line("missing status code"))?;
            let status =
                StatusCode::from_u16(code).map_err(|_e| ParseError::invalid_status_line(format!("status code {code} out of range")))?;
            let reason = match response.reason {
                Some(reason) if !reason.is_empty() => reason.to_owned(),
                _ => return Err(ParseError::invalid_status_line("reason phrase is missing")),
            };

            let mut map = HeaderMap::with_capacity(response.headers.len());
            for h in response.headers.iter() {
                let name = HeaderName::from_bytes(h.name.as_bytes())
                    .map_err(|_e| ParseError::invalid_header(format!("bad header name {:?}", h.name)))?;
                let value = HeaderValue::from_bytes(h.value)
                    .map_err(|_e| ParseError::invalid_header(format!("bad value for header {}", h.name)))?;
                map.append(name, value);
            }

            (ResponseHead::new(status, reason, map), head_end)
        };

        // bytes past the blank line stay in src for the body stage
        src.advance(head_end);

        let payload_size = dispatch_body(&head)?;
        trace!(status = %head.status(), ?payload_size, "parsed response head");

        Ok(Some((head, payload_size)))
    }
}

/// Chooses the body framing for a parsed head.
///
/// Lookup order is `Content-Length` first, then `Transfer-Encoding`; a
/// response with neither is an error rather than an empty body, because a
/// push-server response always carries one of the two.
fn dispatch_body(head: &ResponseHead) -> Result<PayloadSize, ParseError> {
    if let Some(value) = head.headers().get(header::CONTENT_LENGTH) {
        let text = value.to_str().map_err(|_e| ParseError::invalid_content_length("value is not visible ascii"))?;
        let length = text
            .trim()
            .parse::<u64>()
            .map_err(|_e| ParseError::invalid_content_length(format!("value {text} is not u64")))?;
        return Ok(PayloadSize::Length(length));
    }

    if head.headers().get(header::TRANSFER_ENCODING).is_some() {
        return Ok(PayloadSize::Chunked);
    }

    Err(ParseError::UnknownBodyKind)
}
