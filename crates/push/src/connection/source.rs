//! Pushback-capable byte cursor over a socket.

use std::io;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time;
use tokio_util::codec::Decoder;
use tracing::trace;

/// Bytes pulled per socket read
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// A pull-based cursor over an open-ended byte stream, with pushback.
///
/// Consumers (decoders) eat from the front of the internal buffer; whatever
/// a stage leaves unconsumed is exactly what the next stage sees, so an
/// in-progress stream can be handed from the header parser to a body
/// decoder with no byte lost, duplicated, or reordered. [`unread`] prepends
/// surplus bytes a consumer took out but did not need.
///
/// The `&mut` API enforces the single-active-consumer invariant.
///
/// [`unread`]: ByteSource::unread
#[derive(Debug)]
pub struct ByteSource<R> {
    io: R,
    buffer: BytesMut,
    read_timeout: Option<Duration>,
}

impl<R> ByteSource<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(io: R) -> Self {
        Self { io, buffer: BytesMut::with_capacity(READ_CHUNK_SIZE), read_timeout: None }
    }

    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Replaces the per-read deadline. `None` disables it, which is what the
    /// streaming task does: its lifetime is governed by cancellation instead.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout;
    }

    /// Bytes buffered but not yet consumed.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Gives back bytes read but not consumed, so the next read sees them first.
    pub fn unread(&mut self, bytes: Bytes) {
        if bytes.is_empty() {
            return;
        }
        trace!(len = bytes.len(), "pushing back unconsumed bytes");

        let tail = self.buffer.split();
        self.buffer.reserve(bytes.len() + tail.len());
        self.buffer.extend_from_slice(&bytes);
        self.buffer.unsplit(tail);
    }

    /// Pulls one chunk from the socket into the buffer.
    ///
    /// Returns the number of fresh bytes, 0 meaning end-of-stream. Honors
    /// the configured read deadline; an expired deadline surfaces as a
    /// `TimedOut` io error.
    pub async fn fill(&mut self) -> io::Result<usize> {
        self.buffer.reserve(READ_CHUNK_SIZE);

        let n = match self.read_timeout {
            Some(timeout) => time::timeout(timeout, self.io.read_buf(&mut self.buffer))
                .await
                .map_err(|_elapsed| io::Error::new(io::ErrorKind::TimedOut, "read from push server timed out"))??,
            None => self.io.read_buf(&mut self.buffer).await?,
        };

        trace!(read = n, buffered = self.buffer.len(), "filled from socket");
        Ok(n)
    }

    /// Drives a decoder over the buffer, pulling from the socket only when
    /// the decoder needs more input.
    ///
    /// End of stream is delegated to the decoder's [`Decoder::decode_eof`]:
    /// a decoder mid-item rejects the truncation there, a decoder at a
    /// clean boundary reports `Ok(None)`.
    pub async fn decode<D>(&mut self, decoder: &mut D) -> Result<Option<D::Item>, D::Error>
    where
        D: Decoder,
        D::Error: From<io::Error>,
    {
        loop {
            if let Some(item) = decoder.decode(&mut self.buffer)? {
                return Ok(Some(item));
            }

            if self.fill().await? == 0 {
                return decoder.decode_eof(&mut self.buffer);
            }
        }
    }
}
