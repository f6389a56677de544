//! RPC error types.

use thiserror::Error;

/// Boxed error type returned by user-provided method handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server-side errors. Framing and dispatch problems map to 400 responses,
/// handler failures to 500.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unknown method number: {0}")]
    UnknownMethod(i32),

    #[error("method number {0} is already registered")]
    DuplicateMethodNumber(i32),
}

/// Client-side errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid service URL: {0}")]
    InvalidUrl(String),

    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(#[from] soia::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
