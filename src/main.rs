//! Diagnostic HTTP Capture Proxy
//!
//! Point a browser or application at this listener and every request it
//! sends is recorded, echoed, and saved.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌──────────┐    ┌──────────┐    ┌──────────────┐
//!     ───────────────────▶│   net    │───▶│   http   │───▶│   capture    │
//!                         │ listener │    │  server  │    │    store     │
//!     Client Response     └──────────┘    └────┬─────┘    └──────┬───────┘
//!     ◀────────────────────────────────────────┘                 │
//!                                                    ┌───────────┴───────────┐
//!                                                    ▼                       ▼
//!                                             ┌────────────┐          ┌────────────┐
//!                                             │  snapshot  │          │   report   │
//!                                             │ (each req) │          │ (at drain) │
//!                                             └────────────┘          └────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::net::SocketAddr;
use std::process::ExitCode;

use capture_proxy::config::{load_config, validate_config, CaptureConfig};
use capture_proxy::lifecycle::signals;
use capture_proxy::snippet::{write_browser_script, DEFAULT_SCRIPT_PATH};
use capture_proxy::{observability, ProxyService, ServiceError, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "capture-proxy")]
#[command(version, about = "Diagnostic HTTP capture proxy", long_about = None)]
struct Cli {
    /// Port to listen on (default: 8888)
    #[arg(long)]
    port: Option<u16>,

    /// Host to bind (default: 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// Snapshot file (default: captured_requests.json)
    #[arg(long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the browser interception script and exit
    #[arg(long, conflicts_with_all = ["port", "host", "output", "config"])]
    browser_script: bool,

    /// Where --browser-script writes the script
    #[arg(long, default_value = DEFAULT_SCRIPT_PATH)]
    script_path: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.browser_script {
        observability::logging::init("info");
        return match write_browser_script(&cli.script_path) {
            Ok(()) => {
                println!("Browser capture script created: {}", cli.script_path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to write {}: {}", cli.script_path.display(), e);
                ExitCode::FAILURE
            }
        };
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    observability::logging::init(&config.observability.log_level);
    tracing::info!("capture-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    let _signals = signals::spawn_ctrl_c(shutdown.clone());

    let mut service = ProxyService::new(config);
    let addr = match service.start().await {
        Ok(addr) => addr,
        Err(ServiceError::PortInUse { port }) => {
            println!("Port {port} is already in use, choose another port");
            return ExitCode::from(1);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to start");
            return ExitCode::from(1);
        }
    };

    print_banner(addr);

    match service.serve(shutdown_rx).await {
        Ok(summary) => {
            tracing::info!(captured = summary.captured, "Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Capture session failed");
            ExitCode::FAILURE
        }
    }
}

/// Defaults, then the optional file, then CLI flags.
fn build_config(cli: &Cli) -> Result<CaptureConfig, String> {
    let mut config = match &cli.config {
        Some(path) => load_config(path).map_err(|e| format!("{}: {}", path.display(), e))?,
        None => CaptureConfig::default(),
    };

    if let Some(host) = &cli.host {
        config.listener.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.listener.port = port;
    }
    if let Some(output) = &cli.output {
        config.output.snapshot_path = output.clone();
    }

    validate_config(&config).map_err(|errors| {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    })?;
    Ok(config)
}

fn print_banner(addr: SocketAddr) {
    let port = addr.port();
    println!("Capture proxy listening on {addr}");
    println!("Set the browser HTTP proxy to: 127.0.0.1:{port}");
    println!("Or send API requests to: http://127.0.0.1:{port}");
    println!("Press Ctrl+C to stop capturing");
    println!("{}", "=".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from(["capture-proxy", "--port", "9123", "--output", "s.json"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.listener.port, 9123);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.output.snapshot_path, PathBuf::from("s.json"));
    }

    #[test]
    fn browser_script_conflicts_with_serving_flags() {
        assert!(Cli::try_parse_from(["capture-proxy", "--browser-script", "--port", "1"]).is_err());
        let cli = Cli::parse_from(["capture-proxy", "--browser-script"]);
        assert!(cli.browser_script);
        assert_eq!(cli.script_path, PathBuf::from(DEFAULT_SCRIPT_PATH));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
