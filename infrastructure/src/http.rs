//! Shared HTTP plumbing for the remote adapters.
//!
//! Every request races the caller's [`CancellationToken`]; dropping the
//! in-flight reqwest future aborts the connection.

use crate::error::{HttpAdapterError, Result};
use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

const USER_AGENT: &str = concat!("vaultpilot/", env!("CARGO_PKG_VERSION"));

/// Build the client shared by all adapters of one process.
///
/// `timeout` is a transport-level ceiling; the use cases apply their own,
/// tighter budgets on top.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// POST a JSON body and decode a JSON response.
pub async fn post_json<B, T>(
    request: RequestBuilder,
    body: &B,
    cancel: &CancellationToken,
) -> Result<T>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    trace!(
        bytes = serde_json::to_string(body).map_or(0, |s| s.len()),
        "Request payload"
    );
    send(request.json(body), cancel).await
}

/// GET and decode a JSON response.
pub async fn get_json<T>(request: RequestBuilder, cancel: &CancellationToken) -> Result<T>
where
    T: DeserializeOwned,
{
    send(request, cancel).await
}

async fn send<T>(request: RequestBuilder, cancel: &CancellationToken) -> Result<T>
where
    T: DeserializeOwned,
{
    let start = Instant::now();
    let exchange = async {
        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        Ok::<_, HttpAdapterError>((status, text))
    };

    let (status, text) = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(HttpAdapterError::Cancelled),
        result = exchange => result?,
    };

    debug!(
        status = %status,
        elapsed_ms = start.elapsed().as_millis() as u64,
        bytes = text.len(),
        "HTTP response"
    );

    if !status.is_success() {
        return Err(HttpAdapterError::Status { status, body: text });
    }
    Ok(serde_json::from_str(&text)?)
}
