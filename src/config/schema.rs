//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the capture proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the capture proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CaptureConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Where captured requests and the report are written.
    pub output: OutputConfig,

    /// Request parsing limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind host (e.g., "0.0.0.0").
    pub host: String,

    /// Bind port. Zero asks the OS for an ephemeral port.
    pub port: u16,
}

impl ListenerConfig {
    /// The `host:port` string handed to the socket layer.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8888,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the JSON snapshot, rewritten after every capture.
    pub snapshot_path: PathBuf,

    /// Write the snapshot to a temp file and rename it into place.
    /// Off by default: the snapshot is overwritten directly.
    pub atomic_snapshot: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("captured_requests.json"),
            atomic_snapshot: false,
        }
    }
}

/// Limits applied while parsing a request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum size of the request line plus headers.
    pub max_header_bytes: usize,

    /// Maximum accepted `Content-Length`.
    pub max_body_bytes: usize,

    /// Upper bound on the time spent reading and answering one connection.
    /// `None` keeps the fully blocking sequential behaviour.
    pub request_timeout_secs: Option<u64>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_header_bytes: 64 * 1024,
            max_body_bytes: 16 * 1024 * 1024,
            request_timeout_secs: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Print a summary of every capture to stdout.
    pub echo: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            echo: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let config = CaptureConfig::default();
        assert_eq!(config.listener.port, 8888);
        assert_eq!(config.listener.bind_address(), "0.0.0.0:8888");
        assert_eq!(config.output.snapshot_path, PathBuf::from("captured_requests.json"));
        assert!(!config.output.atomic_snapshot);
        assert!(config.limits.request_timeout_secs.is_none());
    }

    #[test]
    fn ipv6_host_is_bracketed() {
        let listener = ListenerConfig {
            host: "::1".to_string(),
            port: 9000,
        };
        assert_eq!(listener.bind_address(), "[::1]:9000");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: CaptureConfig = toml::from_str(
            r#"
            [listener]
            port = 9999

            [output]
            snapshot_path = "session.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.listener.port, 9999);
        assert_eq!(config.output.snapshot_path, PathBuf::from("session.json"));
        assert_eq!(config.observability.log_level, "info");
    }
}
