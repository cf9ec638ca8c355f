//! Sequential capture server.
//!
//! # Responsibilities
//! - Run the accept loop until shutdown is signalled
//! - Handle exactly one request per connection, one connection at a time
//! - Route OPTIONS to the preflight answer, other verbs to the capture store
//! - Turn parse failures into `500` responses without stopping the loop
//!
//! # Design Decisions
//! - Connections are never spawned: capture order is accept order
//! - The store is borrowed mutably for the whole loop (single writer)
//! - No read timeout unless `limits.request_timeout_secs` is set; without it a
//!   client that stalls mid-body blocks every later connection
//! - Shutdown interrupts both the accept and an in-flight request

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::broadcast;

use crate::capture::record::Method;
use crate::capture::store::CaptureStore;
use crate::config::{LimitsConfig, ListenerConfig};
use crate::http::request::{read_body, read_head, ParseError, RequestHead};
use crate::http::response::{Response, CONTINUE};
use crate::net::{Listener, ListenerError};

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// HTTP server feeding the capture store.
pub struct CaptureServer {
    listener: Listener,
    limits: LimitsConfig,
}

impl CaptureServer {
    /// Bind the listening socket.
    pub async fn bind(
        listener: &ListenerConfig,
        limits: LimitsConfig,
    ) -> Result<Self, ListenerError> {
        let listener = Listener::bind(listener).await?;
        Ok(Self { listener, limits })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` fires. The listening socket is closed on return.
    pub async fn run(self, store: &mut CaptureStore, mut shutdown: broadcast::Receiver<()>) {
        let addr = self.listener.local_addr().ok();
        tracing::info!(address = ?addr, "Capture server starting");

        loop {
            let (stream, peer) = tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                },
            };

            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!(
                        peer_addr = %peer,
                        "Shutdown during request, dropping connection"
                    );
                    break;
                }
                _ = self.serve_connection(stream, peer, store) => {}
            }
        }

        drop(self.listener);
        tracing::info!("Capture server stopped");
    }

    async fn serve_connection(
        &self,
        mut stream: TcpStream,
        peer: SocketAddr,
        store: &mut CaptureStore,
    ) {
        let (read_half, mut write_half) = stream.split();
        let mut reader = BufReader::new(read_half);

        let exchange = handle_request(&mut reader, &mut write_half, peer, store, &self.limits);
        let outcome = match self.limits.request_timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), exchange).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(peer_addr = %peer, timeout_secs = secs, "Request timed out");
                    Some((Response::internal_error("request timed out"), "HTTP/1.0".to_string()))
                }
            },
            None => exchange.await,
        };

        let Some((response, version)) = outcome else {
            tracing::debug!(peer_addr = %peer, "Connection closed without a request");
            return;
        };

        if let Err(e) = response.write_to(&mut write_half, &version).await {
            tracing::debug!(peer_addr = %peer, error = %e, "Failed to write response");
        }
        let _ = write_half.shutdown().await;
    }
}

/// Read one request and decide the response.
///
/// Returns the response with the HTTP version to answer in, or `None` when the
/// peer sent nothing at all.
pub async fn handle_request<R, W>(
    reader: &mut R,
    writer: &mut W,
    peer: SocketAddr,
    store: &mut CaptureStore,
    limits: &LimitsConfig,
) -> Option<(Response, String)>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let head = match read_head(reader, limits.max_header_bytes).await {
        Ok(Some(head)) => head,
        Ok(None) => return None,
        Err(e) => {
            tracing::error!(peer_addr = %peer, error = %e, "Failed to parse request");
            return Some((Response::internal_error(&e.to_string()), "HTTP/1.0".to_string()));
        }
    };
    let version = head.version.clone();

    let method = match head.method.parse::<Method>() {
        Ok(method) => method,
        Err(e) => {
            tracing::warn!(
                peer_addr = %peer,
                error = %e,
                target = %head.target,
                "Rejected request"
            );
            return Some((Response::method_not_allowed(), version));
        }
    };

    if method.is_preflight() {
        tracing::debug!(peer_addr = %peer, target = %head.target, "Answered preflight");
        return Some((Response::preflight(), version));
    }

    let response = match capture_body(reader, writer, &head, limits).await {
        Ok(body) => {
            let captured = store.record(head.into_capture(method, &body, peer));
            Response::captured(&captured.timestamp)
        }
        Err(e) => {
            tracing::error!(peer_addr = %peer, error = %e, "Failed to capture request");
            Response::internal_error(&e.to_string())
        }
    };
    Some((response, version))
}

async fn capture_body<R, W>(
    reader: &mut R,
    writer: &mut W,
    head: &RequestHead,
    limits: &LimitsConfig,
) -> Result<Vec<u8>, ParseError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let length = head.content_length();
    if length > 0 && length <= limits.max_body_bytes && head.expects_continue() {
        writer.write_all(CONTINUE).await?;
        writer.flush().await?;
    }
    read_body(reader, length, limits.max_body_bytes).await
}
