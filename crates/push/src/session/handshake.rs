//! Session-creation handshake.
//!
//! Builds the `create_session` request, drives it through a [`Connection`],
//! and parses the response body against the session grammar. Only a 2xx
//! response is eligible for grammar parsing: any other status, and any
//! transport or parse failure, surfaces as a connection-level [`LsError`].

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, info};

use crate::connection::{Connection, NullSink, TransportConfig};
use crate::protocol::{ConnectionMode, LsError, Request, ResponseBody, StreamInfo, StreamRequest};
use crate::session::grammar;

/// Fixed target path of the session-creation request.
pub const CREATE_SESSION_PATH: &str = "/lightstreamer/create_session.txt";

/// Builds the session-creation request for `host`.
pub fn session_request(host: &str, request: &StreamRequest) -> Result<Request, LsError> {
    let query = session_query(request)?;
    Ok(Request::post(format!("{CREATE_SESSION_PATH}?{query}"), host))
}

/// Encodes the query parameters, in the order the server expects them.
fn session_query(request: &StreamRequest) -> Result<String, LsError> {
    let mut params: Vec<(&str, String)> = vec![("LS_op2", "create".to_owned()), ("LS_cause", "new.api".to_owned())];

    match request.mode {
        ConnectionMode::Polling { idle_millis, polling_millis } => {
            params.push(("LS_polling", "true".to_owned()));
            params.push(("LS_polling_millis", polling_millis.to_string()));
            if let Some(idle_millis) = idle_millis {
                params.push(("LS_idle_millis", idle_millis.to_string()));
            }
        }
        ConnectionMode::KeepAlive { max_duration_millis } => {
            params.push(("LS_keepalive_millis", max_duration_millis.to_string()));
        }
    }

    params.push(("LS_cid", request.client_id.clone()));
    params.push(("LS_adapter_set", request.adapter_set.clone()));

    if let Some(credentials) = &request.credentials {
        params.push(("LS_user", credentials.user.clone()));
        params.push(("LS_password", credentials.password.clone()));
    }
    if let Some(content_length) = request.content_length {
        params.push(("LS_content_length", content_length.to_string()));
    }
    if let Some(bandwidth) = request.requested_max_bandwidth {
        params.push(("LS_requested_max_bandwidth", bandwidth.to_string()));
    }
    if request.report_info {
        params.push(("LS_report_info", "true".to_owned()));
    }

    serde_urlencoded::to_string(&params).map_err(|e| LsError::connection(format!("failed to encode session query: {e}")))
}

/// Runs the handshake on an established connection.
pub async fn create_session<R, W>(connection: &mut Connection<R, W>, request: &StreamRequest) -> Result<StreamInfo, LsError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin,
{
    let http_request = session_request(connection.host(), request)?;
    debug!(adapter_set = %request.adapter_set, "creating session");

    connection.send(http_request).await?;
    let response = connection.read_response(NullSink).await?;

    if !response.status().is_success() {
        let message = format!("session request rejected: {} {}", response.status().as_u16(), response.reason());
        if let ResponseBody::Streaming(handle) = response.into_body() {
            handle.cancel();
        }
        return Err(LsError::connection(message));
    }

    let info = match response.into_body() {
        ResponseBody::Bounded(body) => grammar::parse_session_body(&body)?,
        ResponseBody::Streaming(handle) => {
            handle.cancel();
            return Err(LsError::connection("session response arrived as a streaming body"));
        }
        ResponseBody::None => return Err(LsError::connection("session response carried no body")),
    };

    info!(session_id = %info.session_id, keep_alive_millis = info.keep_alive_millis, "session established");
    Ok(info)
}

/// Connects to the push server and runs the handshake in one go.
///
/// Returns the live connection alongside the session parameters, so the
/// caller can bind the stream connection or control requests onto it.
pub async fn connect_and_create(
    host: &str,
    port: u16,
    request: &StreamRequest,
    config: &TransportConfig,
) -> Result<(Connection<OwnedReadHalf, OwnedWriteHalf>, StreamInfo), LsError> {
    let mut connection = Connection::connect(host, port, config).await?;
    let info = create_session(&mut connection, request).await?;
    Ok((connection, info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Credentials;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

    fn polling_request() -> StreamRequest {
        StreamRequest::new("DEMO", ConnectionMode::Polling { idle_millis: Some(1000), polling_millis: 5000 })
    }

    #[test]
    fn polling_query_matches_wire_format() {
        let query = session_query(&polling_request()).unwrap();
        assert_eq!(
            query,
            "LS_op2=create&LS_cause=new.api&LS_polling=true&LS_polling_millis=5000&LS_idle_millis=1000\
             &LS_cid=mgQkwtwdysogQz2BJ4Ji+kOj2Bg&LS_adapter_set=DEMO"
        );
    }

    #[test]
    fn keep_alive_query_has_no_polling_params() {
        let request = StreamRequest::new("DEMO", ConnectionMode::KeepAlive { max_duration_millis: 30000 });
        let query = session_query(&request).unwrap();

        assert!(query.contains("LS_keepalive_millis=30000"));
        assert!(!query.contains("LS_polling"));
    }

    #[test]
    fn optional_params_appended() {
        let mut request = polling_request();
        request.credentials = Some(Credentials { user: "user".to_owned(), password: "secret".to_owned() });
        request.content_length = Some(100_000);
        request.requested_max_bandwidth = Some(12.5);
        request.report_info = true;

        let query = session_query(&request).unwrap();
        assert!(query.contains("LS_user=user&LS_password=secret"));
        assert!(query.contains("LS_content_length=100000"));
        assert!(query.contains("LS_requested_max_bandwidth=12.5"));
        assert!(query.ends_with("LS_report_info=true"));
    }

    #[test]
    fn request_targets_create_session_path() {
        let request = session_request("push.example.com", &polling_request()).unwrap();

        assert_eq!(request.host(), "push.example.com");
        assert!(request.target().starts_with("/lightstreamer/create_session.txt?LS_op2=create"));
    }

    fn test_connection(
        server: DuplexStream,
    ) -> Connection<tokio::io::ReadHalf<DuplexStream>, tokio::io::WriteHalf<DuplexStream>> {
        let (reader, writer) = tokio::io::split(server);
        let config = TransportConfig { connect_timeout: Duration::from_secs(1), read_timeout: Duration::from_secs(1) };
        Connection::from_parts(reader, writer, "push.example.com", &config)
    }

    /// Reads the request head off the server side, then writes the canned response.
    async fn respond_with(client: DuplexStream, response: &str) -> String {
        let mut reader = BufReader::new(client);
        let mut head = String::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let done = line == "\r\n";
            head.push_str(&line);
            if done {
                break;
            }
        }
        reader.get_mut().write_all(response.as_bytes()).await.unwrap();
        head
    }

    #[tokio::test]
    async fn handshake_ok() {
        let (client, server) = tokio::io::duplex(4096);
        let mut connection = test_connection(server);

        let body = "OK\r\nSessionId:S1\r\nKeepaliveMillis:5000\r\nMaxBandwidth:10.5\r\n\r\n";
        let response = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{body}", body.len());
        let server_task = tokio::spawn(async move { respond_with(client, &response).await });

        let info = create_session(&mut connection, &polling_request()).await.unwrap();
        assert_eq!(info.session_id, "S1");
        assert_eq!(info.keep_alive_millis, 5000);
        assert_eq!(info.max_bandwidth, 10.5);

        let head = server_task.await.unwrap();
        assert!(head.starts_with("POST /lightstreamer/create_session.txt?LS_op2=create&LS_cause=new.api"));
        assert!(head.contains("LS_adapter_set=DEMO"));
        assert!(head.contains("Host: push.example.com\r\n"));
    }

    #[tokio::test]
    async fn handshake_server_error_body() {
        let (client, server) = tokio::io::duplex(4096);
        let mut connection = test_connection(server);

        let body = "ERROR\r\n17\r\nbad adapter set\r\n";
        let response = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{body}", body.len());
        let server_task = tokio::spawn(async move { respond_with(client, &response).await });

        let err = create_session(&mut connection, &polling_request()).await.unwrap_err();
        match err {
            LsError::Protocol { code, message } => {
                assert_eq!(code, 17);
                assert_eq!(message, "bad adapter set");
            }
            other => panic!("expected protocol error, got {other}"),
        }
        drop(server_task.await.unwrap());
    }

    #[tokio::test]
    async fn non_2xx_skips_grammar_parse() {
        let (client, server) = tokio::io::duplex(4096);
        let mut connection = test_connection(server);

        // body deliberately holds a valid ERROR production: it must not be parsed
        let body = "ERROR\r\n17\r\nbad adapter set\r\n";
        let response = format!("HTTP/1.1 404 Not Found\r\nContent-Length: {}\r\n\r\n{body}", body.len());
        let server_task = tokio::spawn(async move { respond_with(client, &response).await });

        let err = create_session(&mut connection, &polling_request()).await.unwrap_err();
        match err {
            LsError::Connection { message } => assert!(message.contains("Not Found")),
            other => panic!("expected connection error, got {other}"),
        }
        drop(server_task.await.unwrap());
    }

    #[tokio::test]
    async fn transport_failure_is_connection_error() {
        let (client, server) = tokio::io::duplex(4096);
        let mut connection = test_connection(server);
        drop(client);

        let err = create_session(&mut connection, &polling_request()).await.unwrap_err();
        assert!(matches!(err, LsError::Connection { .. }));
    }
}
