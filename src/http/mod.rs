//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (sequential accept loop)
//!     → request.rs (request line, headers, Content-Length body)
//!     → capture store (non-OPTIONS verbs only)
//!     → response.rs (status, CORS headers, Connection: close)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{split_target, ParseError, RequestHead};
pub use response::{Response, Status};
pub use server::CaptureServer;
