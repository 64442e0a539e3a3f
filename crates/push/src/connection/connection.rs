use std::io;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::SinkExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time;
use tokio_util::codec::FramedWrite;
use tracing::{debug, info};

use crate::codec::body::LengthDecoder;
use crate::codec::{RequestEncoder, ResponseDecoder};
use crate::connection::sink::PushSink;
use crate::connection::source::ByteSource;
use crate::connection::stream_task::spawn_streaming;
use crate::protocol::{HttpResponse, ParseError, PayloadItem, PayloadSize, Request, ResponseBody};

/// Deadlines applied to blocking transport operations.
///
/// The read deadline covers each socket read while parsing a head or a
/// bounded body. Streaming bodies are exempt: a healthy push stream may be
/// silent between updates, so their lifetime is bounded by the handle's
/// cancellation token instead.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { connect_timeout: Duration::from_secs(10), read_timeout: Duration::from_secs(30) }
    }
}

/// A client connection to a push server.
///
/// Owns the socket: a framed writer for outgoing requests and a
/// [`ByteSource`] over the read half. One request/response exchange at a
/// time; once a response dispatches to a streaming body, the source moves
/// into the background task and no further responses can be read from this
/// connection.
#[derive(Debug)]
pub struct Connection<R, W> {
    host: String,
    framed_write: FramedWrite<W, RequestEncoder>,
    source: Option<ByteSource<R>>,
}

impl Connection<OwnedReadHalf, OwnedWriteHalf> {
    /// Resolves `host:port` and connects, first address wins.
    pub async fn connect(host: &str, port: u16, config: &TransportConfig) -> Result<Self, io::Error> {
        let stream = time::timeout(config.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_elapsed| io::Error::new(io::ErrorKind::TimedOut, format!("connecting to {host}:{port} timed out")))??;

        info!(host, port, "connected to push server");
        let (reader, writer) = stream.into_split();
        Ok(Self::from_parts(reader, writer, host, config))
    }
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin,
{
    /// Builds a connection over an already-established byte duplex.
    pub fn from_parts(reader: R, writer: W, host: &str, config: &TransportConfig) -> Self {
        Self {
            host: host.to_owned(),
            framed_write: FramedWrite::new(writer, RequestEncoder),
            source: Some(ByteSource::new(reader).with_read_timeout(Some(config.read_timeout))),
        }
    }

    /// Host this connection was opened against, used for the `Host` header.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Serializes and flushes one request.
    pub async fn send(&mut self, request: Request) -> Result<(), io::Error> {
        debug!(path = request.target(), "sending request");
        self.framed_write.send(request).await
    }

    /// Reads one response: parses the head, then dispatches the body.
    ///
    /// A `Content-Length` body is read to completion before returning. A
    /// `Transfer-Encoding` body forks the chunked decoder onto a background
    /// task feeding `sink` and returns immediately with the task's handle;
    /// this connection gives up its reader to that task for good.
    pub async fn read_response<S>(&mut self, sink: S) -> Result<HttpResponse, ParseError>
    where
        S: PushSink + 'static,
    {
        let mut source = self
            .source
            .take()
            .ok_or_else(|| ParseError::invalid_body("socket reader already owned by a streaming body"))?;

        let (head, payload_size) = match source.decode(&mut ResponseDecoder).await? {
            Some(head_and_size) => head_and_size,
            None => return Err(ParseError::NoResponse),
        };

        match payload_size {
            PayloadSize::Length(length) => {
                let body = read_bounded(&mut source, length).await?;
                self.source = Some(source);

                debug!(status = %head.status(), len = body.len(), "read bounded response");
                Ok(HttpResponse::new(head, ResponseBody::Bounded(body)))
            }
            PayloadSize::Chunked => {
                debug!(status = %head.status(), "response body is chunked, forking streaming task");
                let handle = spawn_streaming(source, sink);
                Ok(HttpResponse::new(head, ResponseBody::Streaming(handle)))
            }
        }
    }
}

/// Reads exactly `length` body bytes; a stream that ends short is fatal.
async fn read_bounded<R>(source: &mut ByteSource<R>, length: u64) -> Result<Bytes, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut decoder = LengthDecoder::new(length);
    let mut body = BytesMut::with_capacity(length.min(64 * 1024) as usize);

    loop {
        match source.decode(&mut decoder).await? {
            Some(PayloadItem::Chunk(bytes)) => body.extend_from_slice(&bytes),
            Some(PayloadItem::Eof) => return Ok(body.freeze()),
            None => {
                return Err(ParseError::io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before content length was satisfied",
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::sink::NullSink;
    use tokio::io::AsyncWriteExt;
    use tokio::sync::mpsc;

    fn test_config() -> TransportConfig {
        TransportConfig { connect_timeout: Duration::from_secs(1), read_timeout: Duration::from_secs(1) }
    }

    fn connection(server: tokio::io::DuplexStream) -> Connection<tokio::io::ReadHalf<tokio::io::DuplexStream>, tokio::io::WriteHalf<tokio::io::DuplexStream>> {
        let (reader, writer) = tokio::io::split(server);
        Connection::from_parts(reader, writer, "push.example.com", &test_config())
    }

    #[tokio::test]
    async fn bounded_response_read_to_completion() {
        let (mut client, server) = tokio::io::duplex(1024);
        let mut connection = connection(server);

        client.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nabcde").await.unwrap();

        let response = connection.read_response(NullSink).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(response.body().as_bounded().unwrap(), &Bytes::from_static(b"abcde"));
    }

    #[tokio::test]
    async fn bounded_body_split_across_writes() {
        let (mut client, server) = tokio::io::duplex(1024);
        let mut connection = connection(server);

        let task = tokio::spawn(async move {
            client.write_all(b"HTTP/1.1 200 OK\r\nContent-Le").await.unwrap();
            client.write_all(b"ngth: 5\r\n\r\nab").await.unwrap();
            client.write_all(b"cde").await.unwrap();
            client
        });

        let response = connection.read_response(NullSink).await.unwrap();
        assert_eq!(response.body().as_bounded().unwrap(), &Bytes::from_static(b"abcde"));
        drop(task.await.unwrap());
    }

    #[tokio::test]
    async fn streaming_response_returns_before_body_ends() {
        let (mut client, server) = tokio::io::duplex(1024);
        let mut connection = connection(server);
        let (tx, mut rx) = mpsc::channel(8);

        client.write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n").await.unwrap();

        // returns while the body is still open
        let response = connection.read_response(tx).await.unwrap();
        assert!(response.body().is_streaming());

        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"abc"));

        client.write_all(b"0\r\n\r\n").await.unwrap();
        let handle = response.into_body().into_streaming().unwrap();
        handle.join().await.unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn reader_gone_after_streaming_dispatch() {
        let (mut client, server) = tokio::io::duplex(1024);
        let mut connection = connection(server);

        client.write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n0\r\n\r\n").await.unwrap();

        let response = connection.read_response(NullSink).await.unwrap();
        response.into_body().into_streaming().unwrap().join().await.unwrap();

        let err = connection.read_response(NullSink).await.unwrap_err();
        assert!(matches!(err, ParseError::InvalidBody { .. }));
    }

    #[tokio::test]
    async fn undeterminable_body_type() {
        let (mut client, server) = tokio::io::duplex(1024);
        let mut connection = connection(server);

        client.write_all(b"HTTP/1.1 200 OK\r\n\r\n").await.unwrap();

        let err = connection.read_response(NullSink).await.unwrap_err();
        assert!(matches!(err, ParseError::UnknownBodyKind));
    }

    #[tokio::test]
    async fn closed_before_any_response() {
        let (client, server) = tokio::io::duplex(1024);
        let mut connection = connection(server);
        drop(client);

        let err = connection.read_response(NullSink).await.unwrap_err();
        assert!(matches!(err, ParseError::NoResponse));
    }

    #[tokio::test]
    async fn short_bounded_body_is_fatal() {
        let (mut client, server) = tokio::io::duplex(1024);
        let mut connection = connection(server);

        client.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc").await.unwrap();
        drop(client);

        let err = connection.read_response(NullSink).await.unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }

    #[tokio::test]
    async fn send_writes_request_through() {
        let (client, server) = tokio::io::duplex(1024);
        let mut connection = connection(server);

        connection.send(Request::post("/ping", "push.example.com")).await.unwrap();

        let mut reader = tokio::io::BufReader::new(client);
        let mut line = String::new();
        tokio::io::AsyncBufReadExt::read_line(&mut reader, &mut line).await.unwrap();
        assert_eq!(line, "POST /ping HTTP/1.1\r\n");
    }
}
