//! Request parsing.
//!
//! # Responsibilities
//! - Read the request line and headers of one HTTP/1 request
//! - Read exactly `Content-Length` body bytes
//! - Split the request target into path and query
//! - Assemble the `CapturedRequest`
//!
//! # Design Decisions
//! - Header names keep the client's spelling
//! - A missing or unparseable `Content-Length` means no body, never an error
//! - The head is buffered up to `max_header_bytes` and handed to `httparse`

use std::net::SocketAddr;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt};
use url::Url;

use crate::capture::record::{capture_timestamp, CapturedRequest, HeaderFields, Method};

const MAX_HEADERS: usize = 100;
const INITIAL_HEAD_CAPACITY: usize = 4096;

/// Error type for request parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed request: {0}")]
    Malformed(#[from] httparse::Error),

    #[error("request head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },

    #[error("connection closed before the request head was complete")]
    TruncatedHead,

    #[error("declared body of {length} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { length: usize, limit: usize },

    #[error("failed to read request: {0}")]
    Io(#[from] std::io::Error),
}

/// Request line and headers of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    /// Method token exactly as sent.
    pub method: String,
    /// Request target exactly as sent.
    pub target: String,
    pub version: String,
    pub headers: HeaderFields,
}

impl RequestHead {
    fn from_parsed(req: &httparse::Request<'_, '_>) -> Self {
        let version = match req.version {
            Some(0) => "HTTP/1.0",
            _ => "HTTP/1.1",
        };
        let mut headers = HeaderFields::new();
        for header in req.headers.iter() {
            headers.insert(header.name, String::from_utf8_lossy(header.value).trim());
        }

        Self {
            method: req.method.unwrap_or_default().to_string(),
            target: req.path.unwrap_or_default().to_string(),
            version: version.to_string(),
            headers,
        }
    }

    /// Declared body length; absent or non-numeric values count as zero.
    pub fn content_length(&self) -> usize {
        self.headers
            .get("content-length")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0)
    }

    /// True for an HTTP/1.1 client waiting on `100 Continue` before sending its body.
    pub fn expects_continue(&self) -> bool {
        self.version == "HTTP/1.1"
            && self
                .headers
                .get("expect")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("100-continue"))
    }

    /// Build the capture entry for this request.
    pub fn into_capture(self, method: Method, body: &[u8], peer: SocketAddr) -> CapturedRequest {
        let (path, query) = split_target(&self.target);
        CapturedRequest {
            timestamp: capture_timestamp(),
            method,
            url: self.target,
            path,
            query,
            headers: self.headers,
            body: String::from_utf8_lossy(body).into_owned(),
            client_ip: peer.ip().to_string(),
        }
    }
}

/// Read one request head.
///
/// Returns `Ok(None)` when the peer closes the connection without sending anything.
pub async fn read_head<R>(
    reader: &mut R,
    max_bytes: usize,
) -> Result<Option<RequestHead>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::with_capacity(INITIAL_HEAD_CAPACITY.min(max_bytes));

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(ParseError::TruncatedHead);
        }

        let before = buf.len();
        let taken = available.len().min(max_bytes.saturating_sub(before));
        buf.extend_from_slice(&available[..taken]);

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut req = httparse::Request::new(&mut headers);
        match req.parse(&buf)? {
            httparse::Status::Complete(len) => {
                reader.consume(len.saturating_sub(before));
                return Ok(Some(RequestHead::from_parsed(&req)));
            }
            httparse::Status::Partial => {
                reader.consume(taken);
                if buf.len() >= max_bytes {
                    return Err(ParseError::HeadTooLarge { limit: max_bytes });
                }
            }
        }
    }
}

/// Read exactly `length` body bytes.
pub async fn read_body<R>(
    reader: &mut R,
    length: usize,
    max_bytes: usize,
) -> Result<Vec<u8>, ParseError>
where
    R: AsyncRead + Unpin,
{
    if length > max_bytes {
        return Err(ParseError::BodyTooLarge {
            length,
            limit: max_bytes,
        });
    }

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// Split a request target into `(path, query)`.
///
/// Absolute-form targets (sent to a configured HTTP proxy) are parsed as URLs.
/// Any fragment is dropped.
pub fn split_target(target: &str) -> (String, String) {
    if target.contains("://") {
        if let Ok(url) = Url::parse(target) {
            return (
                url.path().to_string(),
                url.query().unwrap_or_default().to_string(),
            );
        }
    }

    let without_fragment = target.split('#').next().unwrap_or_default();
    match without_fragment.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (without_fragment.to_string(), String::new()),
    }
}
