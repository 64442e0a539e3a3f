use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};

/// An outgoing HTTP/1.1 request.
///
/// The target carries the full path and query string. `Host` is mandatory
/// and written by the encoder from the `host` field, never from the extra
/// headers.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    target: String,
    host: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    pub fn new(method: Method, target: impl Into<String>, host: impl Into<String>) -> Self {
        Self { method, target: target.into(), host: host.into(), headers: HeaderMap::new(), body: None }
    }

    pub fn post(target: impl Into<String>, host: impl Into<String>) -> Self {
        Self::new(Method::POST, target, host)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }
}
