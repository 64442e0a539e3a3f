//! Wire codecs for the push transport.
//!
//! Everything here implements the `tokio_util::codec` traits over a shared
//! `BytesMut` buffer, so the decoders can be driven by any byte source and
//! handed surplus bytes from a previous stage without copying:
//!
//! - [`ResponseDecoder`]: incremental status line + header block parse,
//!   plus the bounded-vs-chunked body dispatch
//! - [`body::LengthDecoder`] / [`body::ChunkedDecoder`]: the two body framings
//! - [`RequestEncoder`]: serializes outgoing [`Request`]s
//!
//! [`Request`]: crate::protocol::Request

pub mod body;

mod request_encoder;
mod response_decoder;

pub use request_encoder::RequestEncoder;
pub use response_decoder::ResponseDecoder;
