//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use flatserve::access_log::AccessLogEntry;
use flatserve::config::ServerConfig;
use flatserve::http::HttpServer;
use flatserve::lifecycle::Shutdown;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const REPORT_HTML: &str = "<html><body><h1>Quarterly report</h1></body></html>\n";

/// A served root and a log directory, populated with the standard fixture files.
pub struct Fixture {
    pub root: TempDir,
    pub logs: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let logs = tempfile::tempdir().unwrap();

        fs::write(root.path().join("report.html"), REPORT_HTML).unwrap();
        fs::write(root.path().join("style.css"), "body { color: #333; }\n").unwrap();
        fs::write(root.path().join("access.log"), "secret\n").unwrap();
        fs::write(root.path().join("tool.exe"), [0u8; 16]).unwrap();
        fs::write(root.path().join("README"), "no extension\n").unwrap();
        fs::create_dir_all(root.path().join("sub/dir")).unwrap();
        fs::write(root.path().join("sub/dir/file.html"), "nested\n").unwrap();
        fs::create_dir(root.path().join("images.png")).unwrap();

        Self { root, logs }
    }

    pub fn config(&self) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "127.0.0.1:0".to_string();
        config.files.root = self.root.path().to_path_buf();
        config.access_log.directory = self.logs.path().to_path_buf();
        config
    }

    pub fn server(&self) -> HttpServer {
        HttpServer::new(self.config()).unwrap()
    }

    /// Every access log entry currently on disk, across all buckets.
    pub fn log_entries(&self) -> Vec<AccessLogEntry> {
        read_log_entries(self.logs.path())
    }

    /// Poll until at least `n` entries exist; the entry is written after the
    /// response body has been sent, so it can trail the client slightly.
    pub async fn wait_for_log_entries(&self, n: usize) -> Vec<AccessLogEntry> {
        for _ in 0..100 {
            let entries = self.log_entries();
            if entries.len() >= n {
                return entries;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.log_entries()
    }
}

pub fn read_log_entries(dir: &Path) -> Vec<AccessLogEntry> {
    let mut entries = Vec::new();
    for file in fs::read_dir(dir).unwrap() {
        let path = file.unwrap().path();
        for line in fs::read_to_string(&path).unwrap().lines() {
            entries.push(serde_json::from_str(line).unwrap_or_else(|e| panic!("corrupt line {line:?}: {e}")));
        }
    }
    entries
}

/// A server running on an ephemeral port, stopped on drop.
pub struct RunningServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl RunningServer {
    pub async fn start(fixture: &Fixture) -> Self {
        let server = fixture.server();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let signal = shutdown.signal();
        tokio::spawn(async move {
            let _ = server.run(listener, signal).await;
        });

        Self { addr, shutdown }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Send a request with the target written byte-for-byte, bypassing any
/// client-side path normalization. Returns the status code and body.
pub async fn send_raw(addr: SocketAddr, method: &str, target: &str) -> (u16, String) {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    let request = format!("{method} {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    socket.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    socket.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw).into_owned();

    let status = text
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}
