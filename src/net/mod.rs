//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → listener.rs port_in_use (refuse to start on an occupied port)
//!     → listener.rs bind
//!
//! Incoming TCP connection
//!     → listener.rs accept
//!     → Hand off to HTTP layer (one connection at a time)
//! ```

pub mod listener;

pub use listener::{port_in_use, Listener, ListenerError};
