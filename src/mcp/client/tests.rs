use super::*;
use crate::mcp::types::ContentItem;
use crate::utils::test_utils::{closed_endpoint, test_http_client, MockHttpServer, MockReply};
use serde_json::json;

fn test_client() -> ProtocolClient {
    ProtocolClient::with_http_client(test_http_client())
}

fn rpc_result(id: &Value, result: Value) -> MockReply {
    MockReply::json(json!({"jsonrpc": "2.0", "id": id, "result": result}))
}

fn rpc_error(id: &Value, code: i64, message: &str) -> MockReply {
    MockReply::json(json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {"code": code, "message": message}
    }))
}

#[tokio::test]
async fn initialize_sends_handshake_and_returns_server_info() {
    let server = MockHttpServer::start(|request| {
        rpc_result(
            &request.body["id"],
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "nlweb", "version": "0.5.0"}
            }),
        )
    })
    .await;

    let result = test_client()
        .initialize(&server.url())
        .await
        .expect("initialize should succeed")
        .expect("server sent a result");
    assert_eq!(result.protocol_version, "2024-11-05");
    assert_eq!(
        result.server_info.map(|info| info.name).as_deref(),
        Some("nlweb")
    );

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.request_line.starts_with("POST "));
    assert_eq!(request.path, "/mcp");
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(request.rpc_method(), "initialize");
    assert_eq!(request.body["jsonrpc"], "2.0");
    assert_eq!(request.body["params"]["protocolVersion"], MCP_PROTOCOL_VERSION);
    assert_eq!(request.body["params"]["clientInfo"]["name"], MCP_CLIENT_NAME);
    assert_eq!(
        request.body["params"]["clientInfo"]["version"],
        env!("CARGO_PKG_VERSION")
    );
}

#[tokio::test]
async fn initialize_reports_rpc_error_as_protocol_error() {
    let server =
        MockHttpServer::start(|request| rpc_error(&request.body["id"], -32602, "bad version"))
            .await;

    let err = test_client()
        .initialize(&server.url())
        .await
        .expect_err("initialize should fail");
    match &err {
        McpClientError::Protocol { code, message, .. } => {
            assert_eq!(*code, -32602);
            assert_eq!(message, "bad version");
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
    assert_eq!(err.to_string(), "MCP initialization failed: bad version");
}

#[tokio::test]
async fn initialize_accepts_empty_result() {
    let server =
        MockHttpServer::start(|request| MockReply::json(json!({"jsonrpc": "2.0", "id": request.body["id"]})))
            .await;

    let result = test_client()
        .initialize(&server.url())
        .await
        .expect("empty handshake reply is not an error");
    assert!(result.is_none());
}

#[tokio::test]
async fn request_ids_strictly_increase() {
    let server = MockHttpServer::start(|request| {
        rpc_result(&request.body["id"], json!({"tools": []}))
    })
    .await;
    let client = test_client();

    client.initialize(&server.url()).await.expect("initialize");
    client.list_tools(&server.url()).await.expect("list tools");
    client
        .call_tool(&server.url(), "ask", &Map::new())
        .await
        .expect("call tool");

    let ids: Vec<u64> = server
        .requests()
        .iter()
        .map(|request| request.body["id"].as_u64().expect("integer id"))
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "ids: {ids:?}");
}

#[tokio::test]
async fn list_tools_returns_descriptors_in_order() {
    let server = MockHttpServer::start(|request| {
        assert_eq!(request.rpc_method(), "tools/list");
        assert!(request.body.get("params").is_none());
        rpc_result(
            &request.body["id"],
            json!({"tools": [
                {
                    "name": "ask",
                    "description": "Ask a question",
                    "inputSchema": {
                        "type": "object",
                        "properties": {"query": {"type": "string"}},
                        "required": ["query"]
                    }
                },
                {"name": "list_sites", "description": "List indexed sites"}
            ]}),
        )
    })
    .await;

    let tools = test_client()
        .list_tools(&server.url())
        .await
        .expect("list tools should succeed");
    let names: Vec<&str> = tools.iter().map(|tool| tool.name.as_str()).collect();
    assert_eq!(names, ["ask", "list_sites"]);
    assert_eq!(tools[0].input_schema.required, ["query"]);
    assert!(tools[0].input_schema.properties.contains_key("query"));
}

#[tokio::test]
async fn list_tools_is_empty_when_remote_reports_none() {
    let server = MockHttpServer::start(|request| rpc_result(&request.body["id"], json!({}))).await;
    let tools = test_client()
        .list_tools(&server.url())
        .await
        .expect("list tools should succeed");
    assert!(tools.is_empty());
}

#[tokio::test]
async fn call_tool_sends_name_and_arguments() {
    let server = MockHttpServer::start(|request| {
        rpc_result(
            &request.body["id"],
            json!({
                "content": [{"type": "text", "text": "Found 2 recipes"}],
                "structuredContent": {"items": [{"name": "Pie"}]},
                "_meta": {"openai/outputTemplate": "ui://list"}
            }),
        )
    })
    .await;

    let mut args = Map::new();
    args.insert("query".to_string(), json!("pie recipes"));
    args.insert("num_results".to_string(), json!(5));
    let response = test_client()
        .call_tool(&server.url(), "ask", &args)
        .await
        .expect("call should succeed");

    assert_eq!(response.items(), vec![ContentItem::text("Found 2 recipes")]);
    assert_eq!(response.output_template(), Some("ui://list"));
    assert_eq!(
        response.structured_content,
        Some(json!({"items": [{"name": "Pie"}]}))
    );

    let request = &server.requests()[0];
    assert_eq!(request.rpc_method(), "tools/call");
    assert_eq!(request.body["params"]["name"], "ask");
    assert_eq!(request.body["params"]["arguments"]["query"], "pie recipes");
    assert_eq!(request.body["params"]["arguments"]["num_results"], 5);
}

#[tokio::test]
async fn call_tool_reports_rpc_error() {
    let server =
        MockHttpServer::start(|request| rpc_error(&request.body["id"], -32000, "index offline"))
            .await;
    let err = test_client()
        .call_tool(&server.url(), "ask", &Map::new())
        .await
        .expect_err("call should fail");
    assert!(matches!(err, McpClientError::Protocol { code: -32000, .. }));
    assert_eq!(err.to_string(), "Tool call failed: index offline");
}

#[tokio::test]
async fn call_tool_without_result_or_error_is_empty_result() {
    let server = MockHttpServer::start(|request| {
        MockReply::json(json!({"jsonrpc": "2.0", "id": request.body["id"], "result": null}))
    })
    .await;
    let err = test_client()
        .call_tool(&server.url(), "ask", &Map::new())
        .await
        .expect_err("call should fail");
    assert!(matches!(err, McpClientError::EmptyResult { .. }));
    assert_eq!(err.to_string(), "No result from tool call");
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    let endpoint = closed_endpoint().await;
    let err = test_client()
        .call_tool(&endpoint, "ask", &Map::new())
        .await
        .expect_err("call should fail");
    assert!(err.is_transport(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn http_failure_without_rpc_body_is_transport_error() {
    let server = MockHttpServer::start(|_| MockReply::status(502, "upstream down")).await;
    let err = test_client()
        .list_tools(&server.url())
        .await
        .expect_err("list should fail");
    match err {
        McpClientError::Transport { message, .. } => assert!(message.contains("502")),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn http_failure_with_rpc_error_body_is_protocol_error() {
    let server = MockHttpServer::start(|request| {
        MockReply::status(
            400,
            json!({
                "jsonrpc": "2.0",
                "id": request.body["id"],
                "error": {"code": -32600, "message": "Invalid request"}
            })
            .to_string(),
        )
    })
    .await;
    let err = test_client()
        .call_tool(&server.url(), "ask", &Map::new())
        .await
        .expect_err("call should fail");
    assert!(matches!(err, McpClientError::Protocol { code: -32600, .. }));
}

#[tokio::test]
async fn trailing_slash_on_endpoint_is_normalized() {
    let server = MockHttpServer::start(|request| rpc_result(&request.body["id"], json!({"tools": []}))).await;
    test_client()
        .list_tools(&format!("{}/", server.url()))
        .await
        .expect("list tools should succeed");
    assert_eq!(server.requests()[0].path, "/mcp");
}
