//! Session establishment against the push server.

mod grammar;
mod handshake;

pub use grammar::parse_session_body;
pub use handshake::CREATE_SESSION_PATH;
pub use handshake::connect_and_create;
pub use handshake::create_session;
pub use handshake::session_request;
