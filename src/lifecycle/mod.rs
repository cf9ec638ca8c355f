//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (service.rs):
//!     Probe port → Bind listener → Create capture store → Listening
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Close socket → Flush → Report → Stopped
//!
//! Signals (signals.rs):
//!     SIGINT (Ctrl+C) → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: probe first, listener last (nothing touched on conflict)
//! - Ordered shutdown: stop accept, flush, report
//! - No forced-exit deadline: draining is synchronous local file I/O

pub mod service;
pub mod shutdown;
pub mod signals;

pub use service::{ProxyService, ServiceError, ServiceState, SessionSummary};
pub use shutdown::Shutdown;
