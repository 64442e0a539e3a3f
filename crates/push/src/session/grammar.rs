//! Parser for the session-creation response grammar.
//!
//! Two productions over CRLF-terminated lines:
//!
//! ```text
//! OK                                ERROR
//! SessionId:<raw>                   <integer code>
//! ControlAddress:<raw>     (opt)    <message up to end of line>
//! KeepaliveMillis:<int>
//! MaxBandwidth:<float>
//! RequestLimit:<int>       (opt)
//! ServerName:<raw>         (opt)
//! Preamble:<raw>           (opt)
//! <blank line>
//! ```
//!
//! Fields must appear in exactly this order; a field out of place or with a
//! malformed value is fatal. ERROR parses to the protocol-level [`LsError`]
//! variant, everything malformed to the connection-level one.

use bytes::Bytes;

use crate::protocol::{LsError, StreamInfo};

/// Parses the bounded body of a 2xx session response.
pub fn parse_session_body(body: &[u8]) -> Result<StreamInfo, LsError> {
    let mut lines = Lines::new(body);

    match lines.next()? {
        b"OK" => parse_ok(&mut lines),
        b"ERROR" => Err(parse_error(&mut lines)?),
        other => Err(LsError::connection(format!(
            "session response matched neither OK nor ERROR grammar, starts with {:?}",
            String::from_utf8_lossy(other)
        ))),
    }
}

fn parse_ok(lines: &mut Lines<'_>) -> Result<StreamInfo, LsError> {
    let session_id = text(required(lines, "SessionId:")?, "SessionId")?;
    let control_address = optional(lines, "ControlAddress:")?.map(|v| text(v, "ControlAddress")).transpose()?;
    let keep_alive_millis = integer(required(lines, "KeepaliveMillis:")?, "KeepaliveMillis")?;
    let max_bandwidth = float(required(lines, "MaxBandwidth:")?, "MaxBandwidth")?;
    let request_limit = optional(lines, "RequestLimit:")?.map(|v| integer(v, "RequestLimit")).transpose()?;
    let server_name = optional(lines, "ServerName:")?.map(|v| text(v, "ServerName")).transpose()?;
    let preamble = optional(lines, "Preamble:")?.map(Bytes::copy_from_slice);

    let blank = lines.next()?;
    if !blank.is_empty() {
        return Err(LsError::connection(format!(
            "unexpected field in session response: {:?}",
            String::from_utf8_lossy(blank)
        )));
    }

    Ok(StreamInfo {
        session_id,
        keep_alive_millis,
        max_bandwidth,
        control_address,
        request_limit,
        server_name,
        preamble,
    })
}

fn parse_error(lines: &mut Lines<'_>) -> Result<LsError, LsError> {
    let code_line = lines.next()?;
    let code = std::str::from_utf8(code_line)
        .ok()
        .and_then(|s| s.trim().parse::<i32>().ok())
        .ok_or_else(|| LsError::connection(format!("malformed error code line: {:?}", String::from_utf8_lossy(code_line))))?;

    let message = String::from_utf8_lossy(lines.next()?).into_owned();

    Ok(LsError::protocol(code, message))
}

/// CRLF-terminated line cursor. Every line, including the last, must end in
/// CRLF; a dangling tail is malformed.
struct Lines<'a> {
    rest: &'a [u8],
}

impl<'a> Lines<'a> {
    fn new(body: &'a [u8]) -> Self {
        Self { rest: body }
    }

    fn next(&mut self) -> Result<&'a [u8], LsError> {
        let (line, rest) = split_crlf(self.rest)
            .ok_or_else(|| LsError::connection("session response truncated: line not CRLF terminated"))?;
        self.rest = rest;
        Ok(line)
    }

    fn peek(&self) -> Result<&'a [u8], LsError> {
        split_crlf(self.rest)
            .map(|(line, _rest)| line)
            .ok_or_else(|| LsError::connection("session response truncated: line not CRLF terminated"))
    }
}

fn split_crlf(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = bytes.windows(2).position(|w| w == b"\r\n")?;
    Some((&bytes[..pos], &bytes[pos + 2..]))
}

fn required<'a>(lines: &mut Lines<'a>, name: &str) -> Result<&'a [u8], LsError> {
    let line = lines.next()?;
    line.strip_prefix(name.as_bytes()).ok_or_else(|| {
        LsError::connection(format!("expected {name} field, got {:?}", String::from_utf8_lossy(line)))
    })
}

fn optional<'a>(lines: &mut Lines<'a>, name: &str) -> Result<Option<&'a [u8]>, LsError> {
    let line = lines.peek()?;
    match line.strip_prefix(name.as_bytes()) {
        Some(value) => {
            let _consumed = lines.next()?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

fn text(value: &[u8], field: &str) -> Result<String, LsError> {
    String::from_utf8(value.to_vec()).map_err(|_e| LsError::connection(format!("{field} value is not valid utf-8")))
}

fn integer(value: &[u8], field: &str) -> Result<u64, LsError> {
    text(value, field)?
        .trim()
        .parse::<u64>()
        .map_err(|_e| LsError::connection(format!("{field} value is not a non-negative integer")))
}

fn float(value: &[u8], field: &str) -> Result<f64, LsError> {
    text(value, field)?
        .trim()
        .parse::<f64>()
        .map_err(|_e| LsError::connection(format!("{field} value is not a float")))
}
