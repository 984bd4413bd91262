//! Loopback HTTP stub for adapter tests.
//!
//! Serves a fixed sequence of JSON bodies, one per connection, and records
//! the JSON body of every request it receives.

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Client that never goes through a system proxy.
pub(crate) fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Loopback URL nothing listens on.
pub(crate) const UNREACHABLE_URL: &str = "http://127.0.0.1:9/unused";

pub(crate) struct StubServer {
    pub url: String,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl StubServer {
    pub async fn start(responses: Vec<serde_json::Value>) -> Self {
        Self::start_with_status(responses.into_iter().map(|body| (200, body)).collect()).await
    }

    pub async fn start_with_status(responses: Vec<(u16, serde_json::Value)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let request = read_body(&mut socket).await;
                recorded.lock().unwrap().push(request);

                let payload = body.to_string();
                let response = format!(
                    "HTTP/1.1 {status} STUB\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{payload}",
                    payload.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self {
            url: format!("http://{addr}"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_body(socket: &mut TcpStream) -> serde_json::Value {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return serde_json::Value::Null,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
        let length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let start = end + 4;
        if buf.len() >= start + length {
            return serde_json::from_slice(&buf[start..start + length])
                .unwrap_or(serde_json::Value::Null);
        }
    }
}
