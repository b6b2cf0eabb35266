//! Classification of ledger service failures.

use thiserror::Error;

/// Errors that can occur while calling the ledger service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Connection to the service failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The HTTP client gave up waiting for a response.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The service does not know the requested entity (yet).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The service understood the request and refused it.
    #[error("Rejected by ledger service ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// The response decoded but contradicts the request.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl GatewayError {
    /// The only failure worth retrying: a transaction that is not indexed yet.
    pub fn is_not_yet_indexed(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Transport(_) => "transport",
            GatewayError::Timeout(_) => "timeout",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::Rejected { .. } => "rejected",
            GatewayError::Decode(_) => "decode",
            GatewayError::UnexpectedResponse(_) => "unexpected",
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
