//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use connectivity_monitor::config::MonitorConfig;
use connectivity_monitor::lifecycle::{Application, LifecycleEvent, ServeError};

pub const ADMIN_KEY: &str = "test-admin-key";

/// Start a mock backend answering every request with `status` and `body`.
pub async fn start_mock_backend(addr: SocketAddr, status: u16, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind(addr).await.unwrap();
    let local = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;

                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    local
}

/// An address nothing listens on (connections are refused).
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Config pointing at `upstream`, with debounce disabled so tests need no sleeps.
pub fn test_config(upstream: SocketAddr) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.upstream.base_url = format!("http://{}", upstream);
    config.upstream.timeout_secs = 2;
    config.detector.backend_patterns = vec!["127.0.0.1".to_string()];
    config.detector.debounce_ms = 0;
    config.admin.api_key = ADMIN_KEY.to_string();
    config.observability.metrics_enabled = false;
    config
}

pub struct RunningRound {
    pub forward_addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub handle: JoinHandle<Result<LifecycleEvent, ServeError>>,
}

/// Start one serving round on ephemeral ports and wait until it is counting.
pub async fn start_round(app: &Arc<Application>) -> RunningRound {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let admin_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let forward_addr = listener.local_addr().unwrap();
    let admin_addr = admin_listener.local_addr().unwrap();

    let handle = {
        let app = app.clone();
        tokio::spawn(async move { app.serve(listener, Some(admin_listener)).await })
    };

    wait_until(Duration::from_secs(2), || app.detector.is_active()).await;

    RunningRound {
        forward_addr,
        admin_addr,
        handle,
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub async fn wait_until<F>(timeout: Duration, condition: F)
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met within {:?}", timeout);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
