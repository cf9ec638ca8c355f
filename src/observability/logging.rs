//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Apply the configured log level, overridable with `RUST_LOG`
//!
//! # Design Decisions
//! - Logs go to stderr; stdout carries the operator-facing capture echo
//! - `try_init` so tests and embedders may install their own subscriber first

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(log_level: &str) -> String {
    format!("capture_proxy={}", log_level.to_ascii_lowercase())
}

/// Install the global subscriber. Returns false if one was already installed.
pub fn init(log_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(log_level).into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
