//! Error taxonomy for protocol client operations.

use serde_json::Value;
use thiserror::Error;

/// Failures surfaced by [`super::ProtocolClient`]. The client never absorbs
/// these; callers decide how to recover.
#[derive(Debug, Error)]
pub enum McpClientError {
    /// The endpoint could not be reached, answered with a non-2xx status, or
    /// returned a body that is not a decodable JSON-RPC response.
    #[error("Failed to reach {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// The endpoint returned a well-formed JSON-RPC error object.
    #[error("{context}: {message}")]
    Protocol {
        context: &'static str,
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// The endpoint replied with neither a result nor an error.
    #[error("No result from {context}")]
    EmptyResult { context: &'static str },
}

impl McpClientError {
    pub(crate) fn transport(endpoint: &str, message: impl Into<String>) -> Self {
        McpClientError::Transport {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, McpClientError::Transport { .. })
    }
}
