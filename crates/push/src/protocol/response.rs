use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::connection::StreamHandle;

/// Status line and headers of an HTTP response, before the body is read.
///
/// Headers keep their arrival order per name; lookups return the first
/// value and are case-insensitive (`http::HeaderName` semantics).
#[derive(Debug)]
pub struct ResponseHead {
    status: StatusCode,
    reason: String,
    headers: HeaderMap,
}

impl ResponseHead {
    pub fn new(status: StatusCode, reason: String, headers: HeaderMap) -> Self {
        Self { status, reason, headers }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The reason phrase exactly as the server sent it.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of the named header, if any.
    pub fn header<K>(&self, name: K) -> Option<&HeaderValue>
    where
        HeaderName: TryFrom<K>,
    {
        let name = HeaderName::try_from(name).ok()?;
        self.headers.get(name)
    }
}

/// Exactly one body kind per response.
///
/// Bounded bodies are fully read before the response is returned; a
/// streaming body hands out the handle of the background decoding task.
#[derive(Debug)]
pub enum ResponseBody {
    /// No body attached (head parsed, body not yet dispatched)
    None,
    /// A fully read `Content-Length` delimited body
    Bounded(Bytes),
    /// A chunked body being decoded by a background task
    Streaming(StreamHandle),
}

impl ResponseBody {
    #[inline]
    pub fn is_bounded(&self) -> bool {
        matches!(self, ResponseBody::Bounded(_))
    }

    #[inline]
    pub fn is_streaming(&self) -> bool {
        matches!(self, ResponseBody::Streaming(_))
    }

    pub fn as_bounded(&self) -> Option<&Bytes> {
        match self {
            ResponseBody::Bounded(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn into_streaming(self) -> Option<StreamHandle> {
        match self {
            ResponseBody::Streaming(handle) => Some(handle),
            _ => None,
        }
    }
}

/// A parsed HTTP response: head plus its dispatched body.
#[derive(Debug)]
pub struct HttpResponse {
    head: ResponseHead,
    body: ResponseBody,
}

impl HttpResponse {
    pub fn new(head: ResponseHead, body: ResponseBody) -> Self {
        Self { head, body }
    }

    pub fn status(&self) -> StatusCode {
        self.head.status()
    }

    pub fn reason(&self) -> &str {
        self.head.reason()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.head.headers()
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    pub fn into_parts(self) -> (ResponseHead, ResponseBody) {
        (self.head, self.body)
    }
}
