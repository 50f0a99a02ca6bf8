//! In-process HTTP endpoint that records what the hook sends.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Instant};

#[derive(Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is json")
    }
}

pub struct MockServer {
    pub addr: SocketAddr,
    requests: mpsc::UnboundedReceiver<CapturedRequest>,
}

impl MockServer {
    pub fn url(&self) -> String {
        format!("http://{}/api/log", self.addr)
    }

    pub async fn next_request(&mut self) -> CapturedRequest {
        timeout(Duration::from_secs(5), self.requests.recv())
            .await
            .expect("timed out waiting for request")
            .expect("mock server stopped")
    }

    pub async fn assert_no_request(&mut self) {
        let next = timeout(Duration::from_millis(200), self.requests.recv()).await;
        assert!(next.is_err(), "unexpected request: {:?}", next);
    }
}

/// Spawn a server answering every request with `status` and `body`.
///
/// Each request is captured before the response is written, so by the time
/// a client sees the response the request is already queued.
pub async fn spawn_mock_server(status: u16, body: &'static str) -> MockServer {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind ephemeral listener");
    let addr = listener.local_addr().expect("listener has address");
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let _ = serve_one(stream, status, body, tx).await;
            });
        }
    });

    MockServer { addr, requests: rx }
}

/// URL of a local port nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    let addr = listener.local_addr().expect("listener has address");
    drop(listener);
    format!("http://{}/api/log", addr)
}

/// Poll `counter` until it reaches `expected` or five seconds pass.
pub async fn wait_for(counter: &AtomicU64, expected: u64) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while counter.load(Ordering::Relaxed) < expected {
        assert!(Instant::now() < deadline, "counter stuck at {}", counter.load(Ordering::Relaxed));
        sleep(Duration::from_millis(10)).await;
    }
}

async fn serve_one(
    stream: TcpStream,
    status: u16,
    body: &str,
    tx: mpsc::UnboundedSender<CapturedRequest>,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim().to_string();
        if key == "content-length" {
            content_length = value.parse().unwrap_or(0);
        }
        headers.push((key, value));
    }

    let mut raw_body = vec![0u8; content_length];
    reader.read_exact(&mut raw_body).await?;

    let _ = tx.send(CapturedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&raw_body).to_string(),
    });

    let response = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let stream = reader.get_mut();
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
