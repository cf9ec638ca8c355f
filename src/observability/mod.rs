//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, stderr)
//!
//! Capture store produces:
//!     → stdout echo of every captured request
//! ```
//!
//! # Design Decisions
//! - Structured fields (peer_addr, path, error) on every event
//! - Operator echo and diagnostics are kept on separate streams

pub mod logging;
