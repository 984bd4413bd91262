//! Error types shared by the HTTP adapters

use reqwest::StatusCode;
use thiserror::Error;
use vaultpilot_application::{AgentError, GatewayError, ProviderError};

/// Result type alias for HTTP adapter operations
pub type Result<T> = std::result::Result<T, HttpAdapterError>;

/// Errors that can occur when talking to a remote collaborator over HTTP
#[derive(Error, Debug)]
pub enum HttpAdapterError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("JSON-RPC error (code {code}): {message}")]
    Rpc { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("API key not found in environment variable {0}")]
    MissingApiKey(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,
}

impl HttpAdapterError {
    /// Whether the remote side could not be reached at all
    pub fn is_unreachable(&self) -> bool {
        match self {
            HttpAdapterError::Request(e) => e.is_connect(),
            HttpAdapterError::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, HttpAdapterError::Cancelled)
    }
}

impl From<HttpAdapterError> for ProviderError {
    fn from(e: HttpAdapterError) -> Self {
        match e {
            HttpAdapterError::Cancelled => ProviderError::Cancelled,
            HttpAdapterError::Timeout => ProviderError::Timeout,
            HttpAdapterError::Request(ref inner) if inner.is_timeout() => ProviderError::Timeout,
            HttpAdapterError::Serialization(_) | HttpAdapterError::UnexpectedResponse(_) => {
                ProviderError::InvalidResponse(e.to_string())
            }
            HttpAdapterError::Rpc { .. } => ProviderError::ExecutionFailed(e.to_string()),
            other => ProviderError::Unavailable(other.to_string()),
        }
    }
}

impl From<HttpAdapterError> for GatewayError {
    fn from(e: HttpAdapterError) -> Self {
        match e {
            HttpAdapterError::Cancelled => GatewayError::Cancelled,
            HttpAdapterError::Timeout => GatewayError::Timeout,
            HttpAdapterError::Request(ref inner) if inner.is_timeout() => GatewayError::Timeout,
            HttpAdapterError::Request(ref inner) if inner.is_connect() => {
                GatewayError::ConnectionError(e.to_string())
            }
            HttpAdapterError::Status { status, body } if status == StatusCode::NOT_FOUND => {
                GatewayError::ModelNotAvailable(body)
            }
            HttpAdapterError::Serialization(_) | HttpAdapterError::UnexpectedResponse(_) => {
                GatewayError::InvalidResponse(e.to_string())
            }
            other => GatewayError::RequestFailed(other.to_string()),
        }
    }
}

impl From<HttpAdapterError> for AgentError {
    fn from(e: HttpAdapterError) -> Self {
        match e {
            HttpAdapterError::Cancelled => AgentError::Cancelled,
            HttpAdapterError::Timeout => AgentError::Timeout,
            HttpAdapterError::Request(ref inner) if inner.is_timeout() => AgentError::Timeout,
            other => AgentError::Upstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_maps_to_every_port() {
        assert_eq!(
            ProviderError::from(HttpAdapterError::Cancelled),
            ProviderError::Cancelled
        );
        assert!(GatewayError::from(HttpAdapterError::Cancelled).is_cancelled());
        assert!(AgentError::from(HttpAdapterError::Cancelled).is_cancelled());
    }

    #[test]
    fn test_status_mapping() {
        let err = HttpAdapterError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "down".to_string(),
        };
        assert!(err.is_unreachable());
        assert!(matches!(
            ProviderError::from(err),
            ProviderError::Unavailable(_)
        ));

        let err = HttpAdapterError::Status {
            status: StatusCode::NOT_FOUND,
            body: "no such model".to_string(),
        };
        assert!(matches!(
            GatewayError::from(err),
            GatewayError::ModelNotAvailable(m) if m == "no such model"
        ));
    }

    #[test]
    fn test_rpc_error_is_execution_failure() {
        let err = HttpAdapterError::Rpc {
            code: -32601,
            message: "Method not found".to_string(),
        };
        assert_eq!(err.to_string(), "JSON-RPC error (code -32601): Method not found");
        assert!(matches!(
            ProviderError::from(err),
            ProviderError::ExecutionFailed(_)
        ));
    }

    #[test]
    fn test_timeout_maps_to_port_timeouts() {
        assert_eq!(
            ProviderError::from(HttpAdapterError::Timeout),
            ProviderError::Timeout
        );
        assert!(matches!(
            GatewayError::from(HttpAdapterError::Timeout),
            GatewayError::Timeout
        ));
        assert!(matches!(
            AgentError::from(HttpAdapterError::Timeout),
            AgentError::Timeout
        ));
    }
}
