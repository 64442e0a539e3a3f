//! Decoder for chunked transfer coding
//! ([RFC 9112 §7.1](https://www.rfc-editor.org/rfc/rfc9112.html#name-chunked-transfer-coding)).
//!
//! Each chunk is a hexadecimal size line (optionally carrying extensions,
//! which are skipped), the payload bytes, and a terminating CRLF. A
//! zero-size chunk ends the body, optionally followed by trailer fields
//! which are read and ignored.

use std::cmp;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{ParseError, PayloadItem};

use State::*;

/// Byte-at-a-time state machine over the chunked framing.
///
/// Payload bytes are emitted as soon as they are available, possibly split
/// across several [`PayloadItem::Chunk`]s when the wire chunk itself arrives
/// fragmented; ordering across the chunk boundary is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: State,
    /// Payload bytes still owed by the current chunk
    remaining: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Accumulating hex digits of the size line
    Size,
    /// Skipping whitespace and extensions up to the size line CRLF
    SizeExt,
    /// Expecting LF closing the size line
    SizeLf,
    /// Emitting payload bytes
    Data,
    /// Expecting CR after the payload
    DataCr,
    /// Expecting LF after the payload
    DataLf,
    /// Skipping a trailer field line
    Trailer,
    /// Expecting LF closing a trailer line
    TrailerLf,
    /// Expecting CR of the final empty line
    EndCr,
    /// Expecting LF of the final empty line
    EndLf,
    /// Terminal state, body complete
    Done,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: Size, remaining: 0 }
    }

    /// Folds one hex digit into the pending chunk size.
    fn push_size(&mut self, digit: u8) -> Result<(), ParseError> {
        self.remaining = self
            .remaining
            .checked_mul(16)
            .and_then(|size| size.checked_add(u64::from(digit)))
            .ok_or_else(|| ParseError::invalid_body("chunk size overflow"))?;
        Ok(())
    }

    /// Consumes one framing byte and yields the follow-up state.
    fn advance(&mut self, byte: u8) -> Result<State, ParseError> {
        let next = match (self.state, byte) {
            (Size, b @ b'0'..=b'9') => {
                self.push_size(b - b'0')?;
                Size
            }
            (Size, b @ b'a'..=b'f') => {
                self.push_size(b - b'a' + 10)?;
                Size
            }
            (Size, b @ b'A'..=b'F') => {
                self.push_size(b - b'A' + 10)?;
                Size
            }
            (Size, b'\t' | b' ' | b';') => SizeExt,
            (Size | SizeExt, b'\r') => SizeLf,
            (Size, _) => return Err(ParseError::invalid_body("invalid chunk size line")),

            // extensions are skipped, but a bare LF inside one is malformed
            (SizeExt, b'\n') => return Err(ParseError::invalid_body("chunk extension contains bare LF")),
            (SizeExt, _) => SizeExt,

            (SizeLf, b'\n') => {
                if self.remaining == 0 {
                    EndCr
                } else {
                    Data
                }
            }
            (SizeLf, _) => return Err(ParseError::invalid_body("missing LF after chunk size")),

            (DataCr, b'\r') => DataLf,
            (DataCr, _) => return Err(ParseError::invalid_body("missing CR after chunk data")),

            (DataLf, b'\n') => Size,
            (DataLf, _) => return Err(ParseError::invalid_body("missing LF after chunk data")),

            // anything but the final CR here opens a trailer field
            (EndCr, b'\r') => EndLf,
            (EndCr, _) => Trailer,

            (Trailer, b'\r') => TrailerLf,
            (Trailer, _) => Trailer,

            (TrailerLf, b'\n') => EndCr,
            (TrailerLf, _) => return Err(ParseError::invalid_body("missing LF after trailer field")),

            (EndLf, b'\n') => Done,
            (EndLf, _) => return Err(ParseError::invalid_body("missing final LF of chunked body")),

            (Data | Done, _) => unreachable!("handled before framing bytes are consumed"),
        };

        Ok(next)
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if self.state == Done {
                trace!("chunked body complete");
                return Ok(Some(PayloadItem::Eof));
            }

            if src.is_empty() {
                // need more data
                return Ok(None);
            }

            if self.state == Data {
                let len = cmp::min(self.remaining, src.len() as u64) as usize;
                self.remaining -= len as u64;
                if self.remaining == 0 {
                    self.state = DataCr;
                }

                let bytes = src.split_to(len).freeze();
                trace!(len = bytes.len(), "decoded chunk payload");
                return Ok(Some(PayloadItem::Chunk(bytes)));
            }

            let byte = src.get_u8();
            self.state = self.advance(byte)?;
        }
    }

    /// End of stream anywhere before the terminal state is a truncation.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }
        Err(ParseError::invalid_body("connection closed inside chunked body"))
    }
}
