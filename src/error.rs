//! Crate-level error types.
//!
//! [`PipelineError`] unifies every error source (configuration, upstream
//! WebSocket, local HTTP, JSON) behind a single enum so callers can match on
//! the variant they care about while still using `?` for propagation.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// An environment variable or CLI value was missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A WebSocket operation (connect, send, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A request to the local API failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Terminal or socket I/O failed.
    #[error("io error: {0}")]
    Io(String),

    /// The requested symbol is not part of the coin catalog.
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    /// An inbound payload could not be decoded.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The local API answered with a non-success status.
    #[error("server error: {0}")]
    Server(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}
