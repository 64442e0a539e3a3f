use bytes::Bytes;

/// Client id reported to the server in `LS_cid`, the stock generic id.
pub const DEFAULT_CLIENT_ID: &str = "mgQkwtwdysogQz2BJ4Ji kOj2Bg";

/// Adapter-set credentials, sent as `LS_user` / `LS_password`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// How the session connection is driven once established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// One long-lived streaming connection, kept open up to the given duration.
    KeepAlive { max_duration_millis: u64 },
    /// Repeated polling requests.
    Polling { idle_millis: Option<u64>, polling_millis: u64 },
}

/// Parameters of a session-creation request. Immutable once built.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub adapter_set: String,
    pub credentials: Option<Credentials>,
    pub mode: ConnectionMode,
    /// Cap on the content length of the stream connection (`LS_content_length`).
    pub content_length: Option<u64>,
    /// Bandwidth the client asks for; the server grants its own value back.
    pub requested_max_bandwidth: Option<f64>,
    /// Ask the server to include server info fields in the response.
    pub report_info: bool,
    pub client_id: String,
}

impl StreamRequest {
    pub fn new(adapter_set: impl Into<String>, mode: ConnectionMode) -> Self {
        Self {
            adapter_set: adapter_set.into(),
            credentials: None,
            mode,
            content_length: None,
            requested_max_bandwidth: None,
            report_info: false,
            client_id: DEFAULT_CLIENT_ID.to_owned(),
        }
    }
}

/// Result of a successful handshake. Created once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub session_id: String,
    pub keep_alive_millis: u64,
    /// Bandwidth the server granted, in kbit/s.
    pub max_bandwidth: f64,
    /// Host to address control requests to, when different from the session host.
    pub control_address: Option<String>,
    pub request_limit: Option<u64>,
    pub server_name: Option<String>,
    pub preamble: Option<Bytes>,
}
