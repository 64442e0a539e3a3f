//! Encoder serializing outgoing requests.
//!
//! Writes the request line, the mandatory `Host` header, any extra headers,
//! and the body with its `Content-Length` when one is attached.

use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::protocol::Request;

/// Initial buffer size reserved for request serialization
const INIT_REQUEST_SIZE: usize = 1024;

#[derive(Debug)]
pub struct RequestEncoder;

impl Encoder<Request> for RequestEncoder {
    type Error = io::Error;

    fn encode(&mut self, request: Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_REQUEST_SIZE);

        write!(FastWrite(dst), "{} {} HTTP/1.1\r\n", request.method(), request.target())?;
        write!(FastWrite(dst), "Host: {}\r\n", request.host())?;

        for (name, value) in request.headers().iter() {
            dst.put_slice(name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(value.as_ref());
            dst.put_slice(b"\r\n");
        }

        if let Some(body) = request.body_bytes() {
            write!(FastWrite(dst), "Content-Length: {}\r\n", body.len())?;
        }
        dst.put_slice(b"\r\n");

        if let Some(body) = request.body_bytes() {
            dst.put_slice(body);
        }

        trace!(path = request.target(), len = dst.len(), "encoded request");
        Ok(())
    }
}

/// Writer shim over `BytesMut`, space is reserved up front.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderName, HeaderValue};

    #[test]
    fn bodyless_request() {
        let request = Request::post("/lightstreamer/create_session.txt?LS_op2=create", "push.example.com");

        let mut dst = BytesMut::new();
        RequestEncoder.encode(request, &mut dst).unwrap();

        assert_eq!(
            &dst[..],
            &b"POST /lightstreamer/create_session.txt?LS_op2=create HTTP/1.1\r\nHost: push.example.com\r\n\r\n"[..]
        );
    }

    #[test]
    fn extra_headers_and_body() {
        let request = Request::post("/control", "push.example.com")
            .header(HeaderName::from_static("x-client"), HeaderValue::from_static("micro-push"))
            .body(Bytes::from_static(b"op=ping"));

        let mut dst = BytesMut::new();
        RequestEncoder.encode(request, &mut dst).unwrap();

        let text = std::str::from_utf8(&dst[..]).unwrap();
        assert!(text.starts_with("POST /control HTTP/1.1\r\nHost: push.example.com\r\n"));
        assert!(text.contains("x-client: micro-push\r\n"));
        assert!(text.contains("Content-Length: 7\r\n"));
        assert!(text.ends_with("\r\n\r\nop=ping"));
    }
}
