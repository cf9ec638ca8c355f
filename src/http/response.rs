//! Response construction.
//!
//! # Responsibilities
//! - Build the fixed set of responses the listener sends
//! - Attach permissive CORS headers to every response
//! - Serialize to HTTP/1.x wire format
//!
//! # Design Decisions
//! - Every response closes the connection (one request per connection)
//! - Content-Length always set, no chunked encoding

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::capture::record::Method;

/// Status codes used by the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    MethodNotAllowed,
    InternalServerError,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::MethodNotAllowed => 405,
            Status::InternalServerError => 500,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::MethodNotAllowed => "Method Not Allowed",
            Status::InternalServerError => "Internal Server Error",
        }
    }
}

/// Interim response sent to clients that asked for `Expect: 100-continue`.
pub const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

/// A complete response ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Response {
    fn new(status: Status) -> Self {
        Self {
            status,
            headers: cors_headers(),
            body: Vec::new(),
        }
    }

    fn with_body(mut self, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.headers.push(("Content-Type", content_type.to_string()));
        self.body = body.into();
        self
    }

    /// `200` acknowledging a capture.
    pub fn captured(timestamp: &str) -> Self {
        let body = serde_json::json!({ "status": "captured", "timestamp": timestamp });
        Self::new(Status::Ok).with_body("application/json", body.to_string())
    }

    /// `200` with an empty body, for CORS preflight.
    pub fn preflight() -> Self {
        Self::new(Status::Ok)
    }

    /// `405` for verbs the listener does not handle.
    pub fn method_not_allowed() -> Self {
        let mut response = Self::new(Status::MethodNotAllowed);
        response.headers.push(("Allow", Method::ALLOWED.to_string()));
        response
    }

    /// `500` carrying the error text.
    pub fn internal_error(message: &str) -> Self {
        Self::new(Status::InternalServerError).with_body("text/plain; charset=utf-8", message)
    }

    /// Wire encoding of the full response.
    pub fn to_bytes(&self, version: &str) -> Vec<u8> {
        let version = if version == "HTTP/1.1" { "HTTP/1.1" } else { "HTTP/1.0" };
        let mut head = format!(
            "{} {} {}\r\n",
            version,
            self.status.code(),
            self.status.reason()
        );
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        head.push_str("Connection: close\r\n\r\n");

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }

    pub async fn write_to<W>(&self, writer: &mut W, version: &str) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.to_bytes(version)).await?;
        writer.flush().await
    }
}

fn cors_headers() -> Vec<(&'static str, String)> {
    vec![
        ("Access-Control-Allow-Origin", "*".to_string()),
        ("Access-Control-Allow-Methods", Method::ALLOWED.to_string()),
        ("Access-Control-Allow-Headers", "*".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
        response
            .headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn captured_response_is_compact_json() {
        let response = Response::captured("2024-05-01T10:00:00.000000");
        assert_eq!(response.status, Status::Ok);
        assert_eq!(header(&response, "content-type"), Some("application/json"));

        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"status": "captured", "timestamp": "2024-05-01T10:00:00.000000"})
        );
    }

    #[test]
    fn every_response_carries_cors_headers() {
        for response in [
            Response::captured("t"),
            Response::preflight(),
            Response::method_not_allowed(),
            Response::internal_error("boom"),
        ] {
            assert_eq!(header(&response, "Access-Control-Allow-Origin"), Some("*"));
            assert_eq!(header(&response, "Access-Control-Allow-Headers"), Some("*"));
            assert_eq!(
                header(&response, "Access-Control-Allow-Methods"),
                Some("GET, POST, PUT, DELETE, PATCH, OPTIONS")
            );
        }
    }

    #[test]
    fn preflight_has_empty_body() {
        let bytes = Response::preflight().to_bytes("HTTP/1.1");
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("Content-Length: 0\r\nConnection: close\r\n\r\n"));
    }

    #[test]
    fn error_body_is_the_message() {
        let bytes = Response::internal_error("bad things").to_bytes("HTTP/1.0");
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("HTTP/1.0 500 Internal Server Error\r\n"));
        assert!(text.ends_with("\r\n\r\nbad things"));
    }

    #[test]
    fn method_not_allowed_lists_allowed_verbs() {
        let response = Response::method_not_allowed();
        assert_eq!(response.status.code(), 405);
        assert_eq!(header(&response, "allow"), Some(Method::ALLOWED));
    }
}
