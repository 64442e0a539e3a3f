//! Background decoding of streaming (chunked) bodies.
//!
//! A push-update stream may never terminate, so decoding runs on its own
//! tokio task: the caller gets the parsed response head back immediately,
//! holding a [`StreamHandle`] it can join, poll, or cancel. Task failures
//! travel through the handle, never silently dropped.

use std::io;

use tokio::io::AsyncRead;
use tokio::select;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::codec::body::ChunkedDecoder;
use crate::connection::sink::PushSink;
use crate::connection::source::ByteSource;
use crate::protocol::{ParseError, PayloadItem, StreamError};

/// Handle of a running streaming-body task.
///
/// Owns the cancellation token; dropping the handle does not stop the task,
/// cancelling or joining it does.
#[derive(Debug)]
pub struct StreamHandle {
    cancel: CancellationToken,
    join: JoinHandle<Result<(), StreamError>>,
}

impl StreamHandle {
    /// Asks the task to stop before the body terminates on its own.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the task and reports how the stream ended.
    pub async fn join(self) -> Result<(), StreamError> {
        match self.join.await {
            Ok(result) => result,
            Err(_join_error) => Err(StreamError::Aborted),
        }
    }
}

/// Forks the chunked decode loop onto its own task.
///
/// The source moves into the task, which becomes the sole reader of the
/// socket for the rest of the connection's lifetime. Decoded payload goes
/// to the sink in on-wire order; the task completes on the zero-size chunk.
pub fn spawn_streaming<R, S>(mut source: ByteSource<R>, mut sink: S) -> StreamHandle
where
    R: AsyncRead + Unpin + Send + 'static,
    S: PushSink + 'static,
{
    // an idle push stream is legal, the deadline only applies to head and
    // bounded-body reads; lifetime is governed by the cancellation token
    source.set_read_timeout(None);

    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let join = tokio::spawn(async move {
        let mut decoder = ChunkedDecoder::new();
        loop {
            let decoded = select! {
                biased;
                () = token.cancelled() => {
                    debug!("streaming body cancelled");
                    return Ok(());
                }
                decoded = source.decode(&mut decoder) => decoded?,
            };

            match decoded {
                Some(PayloadItem::Chunk(bytes)) => {
                    trace!(len = bytes.len(), "forwarding chunk to sink");
                    sink.deliver(bytes).await.map_err(StreamError::sink)?;
                }
                Some(PayloadItem::Eof) => {
                    debug!("streaming body complete");
                    return Ok(());
                }
                None => {
                    return Err(ParseError::io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed inside chunked body",
                    ))
                    .into());
                }
            }
        }
    });

    StreamHandle { cancel, join }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio::io::AsyncWriteExt;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn delivers_chunks_then_completes() {
        let (mut client, server) = tokio::io::duplex(1024);
        let (tx, mut rx) = mpsc::channel(8);

        let handle = spawn_streaming(ByteSource::new(server), tx);

        client.write_all(b"3\r\nabc\r\n").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"abc"));

        client.write_all(b"0\r\n\r\n").await.unwrap();
        handle.join().await.unwrap();

        // sink sender dropped with the task, nothing further delivered
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn malformed_framing_observable_through_handle() {
        let (mut client, server) = tokio::io::duplex(1024);
        let (tx, _rx) = mpsc::channel(8);

        let handle = spawn_streaming(ByteSource::new(server), tx);

        client.write_all(b"not-hex\r\n").await.unwrap();

        let err = handle.join().await.unwrap_err();
        assert!(matches!(err, StreamError::Parse { .. }));
    }

    #[tokio::test]
    async fn truncated_stream_is_an_error() {
        let (mut client, server) = tokio::io::duplex(1024);
        let (tx, mut rx) = mpsc::channel(8);

        let handle = spawn_streaming(ByteSource::new(server), tx);

        client.write_all(b"5\r\nhel").await.unwrap();
        drop(client);

        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"hel"));
        let err = handle.join().await.unwrap_err();
        assert!(matches!(err, StreamError::Parse { .. }));
    }

    #[tokio::test]
    async fn cancel_stops_the_task() {
        let (mut client, server) = tokio::io::duplex(1024);
        let (tx, mut rx) = mpsc::channel(8);

        let handle = spawn_streaming(ByteSource::new(server), tx);

        client.write_all(b"3\r\nabc\r\n").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"abc"));

        handle.cancel();
        handle.join().await.unwrap();
        assert!(rx.recv().await.is_none());
    }
}
