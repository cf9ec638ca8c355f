//! Capture session orchestration.
//!
//! # Responsibilities
//! - Refuse to start when the port is already taken
//! - Bind the server and create the capture store
//! - Run the accept loop until shutdown
//! - Drain: final snapshot flush, report, summary
//!
//! # State Machine
//! ```text
//! Idle ──start (port free)──▶ Listening ──shutdown──▶ Draining ──flush + report──▶ Stopped
//!   └──start (port taken)──▶ Stopped
//! ```
//!
//! # Design Decisions
//! - One capture session per service value
//! - Nothing is bound or written before the port probe passes
//! - A report write failure is logged; the session still ends cleanly

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::capture::{CaptureStore, JsonSnapshot, ReportGenerator};
use crate::config::CaptureConfig;
use crate::http::CaptureServer;
use crate::net::{port_in_use, ListenerError};

/// Where a capture session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Idle,
    Listening,
    Draining,
    Stopped,
}

/// Error type for the service lifecycle.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("port {port} is already in use")]
    PortInUse { port: u16 },

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("service is {0:?}, expected {1:?}")]
    InvalidState(ServiceState, ServiceState),
}

/// Outcome of a finished capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub captured: usize,
    pub snapshot_path: PathBuf,
    /// `None` when nothing was captured or the report could not be written.
    pub report_path: Option<PathBuf>,
}

/// Owns the listener and the capture store for one session.
pub struct ProxyService {
    config: CaptureConfig,
    state: ServiceState,
    server: Option<CaptureServer>,
    store: Option<CaptureStore>,
}

impl ProxyService {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            state: ServiceState::Idle,
            server: None,
            store: None,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Address of the listening socket while `Listening`.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().and_then(|s| s.local_addr().ok())
    }

    fn transition(&mut self, next: ServiceState) {
        tracing::debug!(from = ?self.state, to = ?next, "Service state change");
        self.state = next;
    }

    /// Probe the port, bind, and move to `Listening`.
    pub async fn start(&mut self) -> Result<SocketAddr, ServiceError> {
        if self.state != ServiceState::Idle {
            return Err(ServiceError::InvalidState(self.state, ServiceState::Idle));
        }

        let listener_config = self.config.listener.clone();
        if port_in_use(&listener_config).await {
            tracing::warn!(port = listener_config.port, "Port already in use");
            self.transition(ServiceState::Stopped);
            return Err(ServiceError::PortInUse {
                port: listener_config.port,
            });
        }

        let server = match CaptureServer::bind(&listener_config, self.config.limits.clone()).await {
            Ok(server) => server,
            Err(e) => {
                self.transition(ServiceState::Stopped);
                return Err(e.into());
            }
        };
        let addr = server
            .local_addr()
            .map_err(|e| ServiceError::Listener(ListenerError::Bind(e)))?;

        let output = &self.config.output;
        let snapshot = JsonSnapshot::new(&output.snapshot_path).atomic(output.atomic_snapshot);
        self.store = Some(
            CaptureStore::new(Box::new(snapshot)).with_echo(self.config.observability.echo),
        );
        tracing::info!(
            address = %addr,
            snapshot = %output.snapshot_path.display(),
            "Capture session started"
        );

        self.server = Some(server);
        self.transition(ServiceState::Listening);
        Ok(addr)
    }

    /// Serve until `shutdown` fires, then drain and stop.
    pub async fn serve(
        &mut self,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<SessionSummary, ServiceError> {
        let (Some(server), Some(store)) = (self.server.take(), self.store.as_mut()) else {
            return Err(ServiceError::InvalidState(self.state, ServiceState::Listening));
        };

        server.run(store, shutdown).await;

        self.transition(ServiceState::Draining);
        let summary = self.drain();
        self.transition(ServiceState::Stopped);
        Ok(summary)
    }

    fn drain(&mut self) -> SessionSummary {
        let snapshot_path = self.config.output.snapshot_path.clone();
        let Some(store) = self.store.as_ref() else {
            return SessionSummary {
                captured: 0,
                snapshot_path,
                report_path: None,
            };
        };

        // The final flush also creates the snapshot when nothing was captured.
        store.flush();

        let report_path = match ReportGenerator::new().generate(store.entries(), &snapshot_path) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!(error = %e, "Failed to write report");
                None
            }
        };

        println!("\nCapture finished: {} requests captured", store.len());
        println!("Snapshot saved to: {}", snapshot_path.display());
        if let Some(path) = &report_path {
            println!("Report saved to: {}", path.display());
        }

        SessionSummary {
            captured: store.len(),
            snapshot_path,
            report_path,
        }
    }
}
