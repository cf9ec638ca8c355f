//! Diagnostic HTTP Capture Proxy Library

pub mod capture;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod snippet;

pub use capture::{CaptureStore, CapturedRequest, ReportGenerator};
pub use config::schema::CaptureConfig;
pub use http::CaptureServer;
pub use lifecycle::{ProxyService, ServiceError, ServiceState, SessionSummary, Shutdown};
