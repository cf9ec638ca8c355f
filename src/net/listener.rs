//! TCP listener implementation.
//!
//! # Responsibilities
//! - Probe the target port before binding
//! - Bind to the configured host and port
//! - Accept incoming TCP connections one at a time
//!
//! # Design Decisions
//! - No connection limit: the accept loop never holds more than one connection
//! - The probe connects instead of binding, so it cannot claim the port itself

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ListenerConfig;

/// How long the startup probe waits for a connection to an occupied port.
const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind(std::io::Error),
    /// Failed to accept connection.
    Accept(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind(e) | ListenerError::Accept(e) => Some(e),
        }
    }
}

/// Returns true when something already accepts connections on the port.
///
/// Wildcard hosts are probed through loopback.
pub async fn port_in_use(config: &ListenerConfig) -> bool {
    if config.port == 0 {
        return false;
    }

    let probe_ip = match config.host.parse::<IpAddr>() {
        Ok(ip) if ip.is_unspecified() && ip.is_ipv6() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        Ok(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Ok(ip) => ip,
        Err(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
    };
    let target = SocketAddr::new(probe_ip, config.port);

    match tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect(target)).await {
        Ok(Ok(_)) => {
            tracing::debug!(address = %target, "Port probe connected");
            true
        }
        _ => false,
    }
}

/// A TCP listener handing out one connection per `accept`.
pub struct Listener {
    /// The underlying TCP listener.
    inner: TcpListener,
}

impl Listener {
    /// Bind to the configured address.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let listener = TcpListener::bind(config.bind_address())
            .await
            .map_err(ListenerError::Bind)?;

        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner: listener })
    }

    /// Accept a new connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(peer_addr = %addr, "Connection accepted");

        Ok((stream, addr))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }
}
