//! Connection handling for the push transport.
//!
//! # Components
//!
//! - [`Connection`]: owns the socket, sends requests, reads responses
//! - [`ByteSource`]: pushback-capable byte cursor shared by the parsing stages
//! - [`PushSink`]: where streaming-body bytes are delivered
//! - [`StreamHandle`]: handle of the background chunked-decoding task
//!
//! Reads of the response head and of bounded bodies block the caller (under
//! the configured deadline); a chunked body forks onto its own task so the
//! caller is never stuck behind a body that may not terminate.

mod connection;
mod sink;
mod source;
mod stream_task;

pub use connection::Connection;
pub use connection::TransportConfig;
pub use sink::NullSink;
pub use sink::PushSink;
pub use source::ByteSource;
pub use stream_task::StreamHandle;
pub use stream_task::spawn_streaming;
