//! Decoder for `Content-Length` delimited bodies.

use std::cmp;
use std::io;

use crate::protocol::{ParseError, PayloadItem};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Reads exactly the number of body bytes announced by `Content-Length`,
/// emitting them as chunks as they arrive and `Eof` once the count is
/// exhausted. Surplus bytes past the count are left untouched in the buffer.
///
/// The stream ending while bytes are still owed is fatal, handled in
/// [`Decoder::decode_eof`]: the peer announced a length it did not deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// Bytes still owed by the body
    remaining: u64,
}

impl LengthDecoder {
    pub fn new(length: u64) -> Self {
        Self { remaining: length }
    }
}

impl Decoder for LengthDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.remaining == 0 {
            return Ok(Some(PayloadItem::Eof));
        }

        if src.is_empty() {
            return Ok(None);
        }

        let len = cmp::min(src.len() as u64, self.remaining) as usize;
        self.remaining -= len as u64;
        Ok(Some(PayloadItem::Chunk(src.split_to(len).freeze())))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }
        Err(ParseError::io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stream ended before content length was satisfied",
        )))
    }
}
