//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use capture_proxy::config::CaptureConfig;
use capture_proxy::{ProxyService, ServiceError, SessionSummary, Shutdown};

/// A running capture session rooted in a temp directory.
pub struct TestSession {
    pub addr: SocketAddr,
    pub snapshot: PathBuf,
    pub dir: tempfile::TempDir,
    shutdown: Shutdown,
    handle: JoinHandle<Result<SessionSummary, ServiceError>>,
}

/// Loopback config on an ephemeral port, writing into `dir`.
pub fn test_config(dir: &Path) -> CaptureConfig {
    let mut config = CaptureConfig::default();
    config.listener.host = "127.0.0.1".to_string();
    config.listener.port = 0;
    config.output.snapshot_path = dir.join("captured_requests.json");
    config.observability.echo = false;
    config
}

/// Start a session and wait until it is listening.
pub async fn start_session() -> TestSession {
    start_session_with(|_| {}).await
}

/// Like [`start_session`], with a chance to adjust the config first.
pub async fn start_session_with(configure: impl FnOnce(&mut CaptureConfig)) -> TestSession {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    configure(&mut config);
    let snapshot = config.output.snapshot_path.clone();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let mut service = ProxyService::new(config);
    let addr = service.start().await.unwrap();

    let handle = tokio::spawn(async move { service.serve(rx).await });

    TestSession {
        addr,
        snapshot,
        dir,
        shutdown,
        handle,
    }
}

impl TestSession {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    /// Current snapshot contents as JSON.
    pub fn snapshot_json(&self) -> serde_json::Value {
        let text = std::fs::read_to_string(&self.snapshot).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    /// Trigger shutdown and wait for the drain to finish.
    pub async fn stop(self) -> (SessionSummary, tempfile::TempDir) {
        self.shutdown.trigger();
        let summary = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("session did not stop")
            .unwrap()
            .unwrap();
        (summary, self.dir)
    }
}

/// HTTP client that never reuses connections or consults proxy env vars.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Send raw bytes and read the full response until the server closes.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> String {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(request).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), socket.read_to_end(&mut response))
        .await
        .expect("server did not close the connection")
        .unwrap();
    String::from_utf8_lossy(&response).into_owned()
}
