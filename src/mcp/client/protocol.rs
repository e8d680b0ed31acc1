//! JSON-RPC 2.0 envelopes exchanged with tool-serving endpoints.
//!
//! Inbound responses are decoded into [`RpcResponse`], a closed sum type, so
//! callers never probe `result`/`error` fields directly. A response that
//! carries neither is kept as [`RpcResponse::Empty`] rather than rejected at
//! the decoding layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifier. This client only ever sends integers, but servers
/// are allowed to echo strings back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Integer(u64),
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Integer(id) => write!(f, "{id}"),
            RequestId::String(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub id: RequestId,
}

impl RpcRequest {
    pub fn new(id: u64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.to_string(),
            params,
            id: RequestId::Integer(id),
        }
    }
}

/// Error object carried by a failed JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RpcResponse {
    Success {
        id: Option<RequestId>,
        result: Value,
    },
    Failure {
        id: Option<RequestId>,
        error: RpcError,
    },
    /// Neither `result` nor `error` was present (or `result` was null).
    Empty { id: Option<RequestId> },
}

impl RpcResponse {
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            RpcResponse::Success { id, .. }
            | RpcResponse::Failure { id, .. }
            | RpcResponse::Empty { id } => id.as_ref(),
        }
    }
}

#[derive(Deserialize)]
struct RawResponse {
    #[serde(default)]
    id: Option<RequestId>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

impl From<RawResponse> for RpcResponse {
    fn from(raw: RawResponse) -> Self {
        // An error object wins over a result if a server sends both.
        match (raw.error, raw.result) {
            (Some(error), _) => RpcResponse::Failure { id: raw.id, error },
            (None, Some(result)) => RpcResponse::Success { id: raw.id, result },
            (None, None) => RpcResponse::Empty { id: raw.id },
        }
    }
}

impl<'de> Deserialize<'de> for RpcResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        RawResponse::deserialize(deserializer).map(RpcResponse::from)
    }
}

pub fn parse_response(body: &[u8]) -> Result<RpcResponse, serde_json::Error> {
    serde_json::from_slice(body)
}
