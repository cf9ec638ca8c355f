//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, log level known)
//! - Reject an empty snapshot path
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CaptureConfig → Result<(), Vec<ValidationError>>
//! - Port 0 is accepted; it binds an ephemeral port

use thiserror::Error;

use crate::config::schema::CaptureConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.host must not be empty")]
    EmptyHost,

    #[error("output.snapshot_path must not be empty")]
    EmptySnapshotPath,

    #[error("limits.{0} must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("observability.log_level `{0}` is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &CaptureConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if config.output.snapshot_path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptySnapshotPath);
    }
    if config.limits.max_header_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("max_header_bytes"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("max_body_bytes"));
    }
    if config.limits.request_timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroLimit("request_timeout_secs"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
