//! Protocol value types and errors.
//!
//! Everything the transport reads or writes is modelled here: the outgoing
//! [`Request`], the parsed [`HttpResponse`] with its tagged body variant,
//! the handshake parameter and result records ([`StreamRequest`],
//! [`StreamInfo`]), and the error taxonomy ([`ParseError`] for malformed
//! input, [`LsError`] for handshake failures, [`StreamError`] for the
//! streaming task).

mod message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::Request;

mod response;
pub use response::HttpResponse;
pub use response::ResponseBody;
pub use response::ResponseHead;

mod session;
pub use session::ConnectionMode;
pub use session::Credentials;
pub use session::DEFAULT_CLIENT_ID;
pub use session::StreamInfo;
pub use session::StreamRequest;

mod error;
pub use error::LsError;
pub use error::ParseError;
pub use error::StreamError;

pub mod table;
