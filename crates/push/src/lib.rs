//! An asynchronous micro Lightstreamer push-client transport
//!
//! This crate implements the client side of a server-push streaming
//! protocol: it opens a long-lived HTTP/1.1 connection to a push server,
//! negotiates a session, and consumes a response body that is either a
//! bounded (`Content-Length`) blob or an indefinite chunked stream of push
//! updates, built on top of tokio.
//!
//! # Features
//!
//! - Incremental response parsing, correct under any socket fragmentation
//! - Pushback byte source: unconsumed bytes hand over between stages losslessly
//! - Chunked bodies decoded on a background task, caller never blocked
//! - Cancellation and read deadlines for unresponsive peers
//! - Typed session handshake (OK / ERROR response grammars)
//! - Clean error taxonomy: transport vs parse vs in-band protocol errors
//!
//! # Example
//!
//! ```no_run
//! use micro_push::connection::TransportConfig;
//! use micro_push::protocol::{ConnectionMode, StreamRequest};
//! use micro_push::session;
//! use tracing::Level;
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     let subscriber = FmtSubscriber::builder()
//!         .with_max_level(Level::INFO)
//!         .finish();
//!     tracing::subscriber::set_global_default(subscriber)
//!         .expect("setting default subscriber failed");
//!
//!     let request = StreamRequest::new(
//!         "DEMO",
//!         ConnectionMode::Polling { idle_millis: None, polling_millis: 5000 },
//!     );
//!     let config = TransportConfig::default();
//!
//!     match session::connect_and_create("push.example.com", 80, &request, &config).await {
//!         Ok((_connection, info)) => {
//!             println!("session {} established, keepalive {}ms", info.session_id, info.keep_alive_millis);
//!         }
//!         Err(e) => eprintln!("handshake failed: {e}"),
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: socket ownership, byte source with pushback, request
//!   send / response read, the background streaming task
//! - [`codec`]: response-head decoder, bounded and chunked body decoders,
//!   request encoder
//! - [`protocol`]: value types (requests, responses, session records,
//!   control shapes) and errors
//! - [`session`]: the `create_session` handshake and its response grammar
//!
//! # Concurrency model
//!
//! A single control flow sends the request and parses the head and bounded
//! bodies, suspending at each socket read under a configurable deadline.
//! Only a chunked body forks: decoding continues on its own task, feeding a
//! caller-supplied [`connection::PushSink`] in on-wire order, while the
//! caller holds a [`connection::StreamHandle`] to join or cancel it. Once a
//! streaming body starts, that task is the sole reader of the socket for
//! the rest of the connection's lifetime.
//!
//! # Limitations
//!
//! - HTTP/1.1 only, no TLS (front it with a proxy if needed)
//! - No connection reuse across sessions
//! - Subscription/control operations are value shapes only
//!   ([`protocol::table`]); their wire encoding is not implemented here

pub mod codec;
pub mod connection;
pub mod protocol;
pub mod session;

mod utils;
pub(crate) use utils::ensure;
