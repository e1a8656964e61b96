//! Error types for the lounge agent

use std::time::Duration;

use thiserror::Error;

/// Result type alias for lounge agent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the agent, the tool server, or their collaborators
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tool arguments failed schema validation; the handler never ran.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backing lounge/flight lookup failed.
    #[error("Upstream lookup error: {0}")]
    Upstream(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// The model step failed; fatal to the current agent invocation.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Conversation error: {0}")]
    Conversation(String),

    /// Error envelope returned by a tool server.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Max iterations reached ({0})")]
    MaxIterations(usize),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(format!("{err:#}"))
    }
}
