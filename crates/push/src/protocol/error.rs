use std::io;
use thiserror::Error;

/// Errors raised while reading or parsing an HTTP response from the push server.
///
/// Parse errors are fatal to the current read: the connection is left in an
/// undefined position and must be dropped.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("no response provided")]
    NoResponse,

    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid status line: {reason}")]
    InvalidStatusLine { reason: String },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("could not determine body type of response")]
    UnknownBodyKind,

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_status_line<S: ToString>(str: S) -> Self {
        Self::InvalidStatusLine { reason: str.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Failure modes of the session handshake.
///
/// A `Protocol` error is an expected, in-band refusal reported by the server
/// through the ERROR grammar. Everything else (socket failures, timeouts,
/// malformed responses, non-2xx statuses) surfaces as a `Connection` error
/// with a human-readable message. The two are never conflated.
#[derive(Error, Debug)]
pub enum LsError {
    #[error("server error {code}: {message}")]
    Protocol { code: i32, message: String },

    #[error("connection error: {message}")]
    Connection { message: String },
}

impl LsError {
    pub fn protocol<S: ToString>(code: i32, message: S) -> Self {
        Self::Protocol { code, message: message.to_string() }
    }

    pub fn connection<S: ToString>(message: S) -> Self {
        Self::Connection { message: message.to_string() }
    }
}

impl From<ParseError> for LsError {
    fn from(e: ParseError) -> Self {
        Self::connection(e)
    }
}

impl From<io::Error> for LsError {
    fn from(e: io::Error) -> Self {
        Self::connection(e)
    }
}

/// Errors produced by the background task decoding a streaming body.
///
/// Never swallowed: whatever owns the [`StreamHandle`] observes the failure
/// when joining the task.
///
/// [`StreamHandle`]: crate::connection::StreamHandle
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("chunked stream error: {source}")]
    Parse {
        #[from]
        source: ParseError,
    },

    #[error("sink rejected chunk: {reason}")]
    Sink { reason: String },

    #[error("streaming task aborted")]
    Aborted,
}

impl StreamError {
    pub fn sink<S: ToString>(reason: S) -> Self {
        Self::Sink { reason: reason.to_string() }
    }
}
