//! JSON-RPC client for tool-serving endpoints.
//!
//! Every exchange is a single `POST <endpoint>/mcp` carrying one request and
//! answered by one response. The client keeps no session; the only state is
//! a request counter used to pair requests with responses.

use crate::mcp::types::{
    Implementation, InitializeResult, ListToolsResult, Tool, ToolCallResponse,
};
use crate::utils::url::construct_api_url;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

mod error;
pub mod protocol;

pub use error::McpClientError;
use protocol::{RpcRequest, RpcResponse};

pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const MCP_CLIENT_NAME: &str = "nlweb-chat";
const MCP_PATH: &str = "mcp";
const MCP_JSON_CONTENT_TYPE: &str = "application/json";
const MCP_HTTP_CONNECT_TIMEOUT_SECONDS: u64 = 10;
const MCP_HTTP_POOL_IDLE_TIMEOUT_SECONDS: u64 = 90;
const MCP_HTTP_POOL_MAX_IDLE_PER_HOST: usize = 8;

/// Builds the HTTP client used for tool calls. `request_timeout` is left
/// unset by default: a tool call runs until the remote answers or the
/// connection fails.
pub fn build_mcp_http_client(
    request_timeout: Option<Duration>,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(MCP_HTTP_CONNECT_TIMEOUT_SECONDS))
        .pool_idle_timeout(Duration::from_secs(MCP_HTTP_POOL_IDLE_TIMEOUT_SECONDS))
        .pool_max_idle_per_host(MCP_HTTP_POOL_MAX_IDLE_PER_HOST);
    if let Some(timeout) = request_timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

pub fn client_details() -> Implementation {
    Implementation {
        name: MCP_CLIENT_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

pub struct ProtocolClient {
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl ProtocolClient {
    pub fn new(request_timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        Ok(Self::with_http_client(build_mcp_http_client(
            request_timeout,
        )?))
    }

    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self {
            http,
            next_id: AtomicU64::new(1),
        }
    }

    /// Ids are strictly increasing for the lifetime of this client and carry
    /// no meaning beyond pairing a request with its response.
    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Performs the protocol handshake. Returns the server's initialize
    /// result when it sent one.
    pub async fn initialize(
        &self,
        endpoint: &str,
    ) -> Result<Option<InitializeResult>, McpClientError> {
        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": client_details(),
        });
        match self.send(endpoint, "initialize", Some(params)).await? {
            RpcResponse::Success { result, .. } => {
                match serde_json::from_value::<InitializeResult>(result) {
                    Ok(result) => Ok(Some(result)),
                    Err(err) => {
                        debug!(endpoint, error = %err, "Ignoring unreadable initialize result");
                        Ok(None)
                    }
                }
            }
            RpcResponse::Failure { error, .. } => Err(protocol_error(
                "MCP initialization failed",
                error,
            )),
            RpcResponse::Empty { .. } => Ok(None),
        }
    }

    pub async fn list_tools(&self, endpoint: &str) -> Result<Vec<Tool>, McpClientError> {
        match self.send(endpoint, "tools/list", None).await? {
            RpcResponse::Success { result, .. } => {
                let list = serde_json::from_value::<ListToolsResult>(result).map_err(|err| {
                    McpClientError::transport(endpoint, format!("invalid tools/list result: {err}"))
                })?;
                Ok(list.tools)
            }
            RpcResponse::Failure { error, .. } => {
                Err(protocol_error("Failed to list tools", error))
            }
            RpcResponse::Empty { .. } => Ok(Vec::new()),
        }
    }

    pub async fn call_tool(
        &self,
        endpoint: &str,
        tool_name: &str,
        args: &Map<String, Value>,
    ) -> Result<ToolCallResponse, McpClientError> {
        let params = json!({
            "name": tool_name,
            "arguments": args,
        });
        match self.send(endpoint, "tools/call", Some(params)).await? {
            RpcResponse::Success { result, .. } => serde_json::from_value(result).map_err(|err| {
                McpClientError::transport(endpoint, format!("invalid tools/call result: {err}"))
            }),
            RpcResponse::Failure { error, .. } => Err(protocol_error("Tool call failed", error)),
            RpcResponse::Empty { .. } => Err(McpClientError::EmptyResult {
                context: "tool call",
            }),
        }
    }

    async fn send(
        &self,
        endpoint: &str,
        method: &str,
        params: Option<Value>,
    ) -> Result<RpcResponse, McpClientError> {
        let id = self.next_request_id();
        let url = construct_api_url(endpoint, MCP_PATH);
        let request = RpcRequest::new(id, method, params);
        debug!(%url, method, id, "Sending MCP request");

        let response = self
            .http
            .post(&url)
            .header("Accept", MCP_JSON_CONTENT_TYPE)
            .json(&request)
            .send()
            .await
            .map_err(|err| McpClientError::transport(endpoint, err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| McpClientError::transport(endpoint, err.to_string()))?;
        let parsed = protocol::parse_response(&body);

        if !status.is_success() {
            // Some servers pair a 4xx/5xx status with a JSON-RPC error body.
            return match parsed {
                Ok(failure @ RpcResponse::Failure { .. }) => Ok(failure),
                _ => Err(McpClientError::transport(
                    endpoint,
                    format!("HTTP error: {status}"),
                )),
            };
        }

        let parsed = parsed.map_err(|err| {
            McpClientError::transport(endpoint, format!("invalid JSON-RPC response: {err}"))
        })?;
        if let Some(response_id) = parsed.id() {
            if *response_id != protocol::RequestId::Integer(id) {
                debug!(method, id, %response_id, "MCP response id does not match request");
            }
        }
        Ok(parsed)
    }
}

fn protocol_error(context: &'static str, error: protocol::RpcError) -> McpClientError {
    McpClientError::Protocol {
        context,
        code: error.code,
        message: error.message,
        data: error.data,
    }
}

#[cfg(test)]
mod tests;
