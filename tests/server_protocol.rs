mod common;

use annotations_mcp::mcp::server::McpServer;
use common::{app_with, item_path, system_resource, user_path, user_resource, RecordingClient};
use serde_json::{json, Value};
use std::sync::Arc;

fn server_with(client: Arc<RecordingClient>) -> McpServer {
    McpServer::new(Arc::new(app_with(client)))
}

async fn roundtrip(server: &McpServer, request: Value) -> Value {
    let response = server
        .handle_line(&request.to_string())
        .await
        .expect("response");
    serde_json::to_value(response).expect("encode")
}

async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> Value {
    roundtrip(
        server,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        }),
    )
    .await
}

#[tokio::test]
async fn initialize_reports_server_info() {
    let server = server_with(RecordingClient::new());
    let response = roundtrip(
        &server,
        json!({"jsonrpc": "2.0", "id": 0, "method": "initialize", "params": {}}),
    )
    .await;
    assert_eq!(response["result"]["serverInfo"]["name"], "annotations-mcp");
    assert!(response["result"]["protocolVersion"].is_string());
}

#[tokio::test]
async fn tools_list_includes_tools_hints_and_aliases() {
    let server = server_with(RecordingClient::new());
    let response = roundtrip(
        &server,
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
    )
    .await;
    let tools = response["result"]["tools"].as_array().expect("tools");
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    for expected in [
        "annotations_create",
        "annotations_list",
        "annotations_get",
        "annotations_update",
        "annotations_delete",
        "analytics_annotations_list",
    ] {
        assert!(names.contains(&expected), "missing {}", expected);
    }
    let delete = tools
        .iter()
        .find(|t| t["name"] == "annotations_delete")
        .expect("delete");
    assert_eq!(delete["annotations"]["destructiveHint"], true);
    assert_eq!(delete["inputSchema"]["additionalProperties"], false);
}

#[tokio::test]
async fn notifications_get_no_reply() {
    let server = server_with(RecordingClient::new());
    let response = server
        .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
    assert!(response.is_none());
    assert!(server.handle_line("   ").await.is_none());
}

#[tokio::test]
async fn protocol_errors_use_json_rpc_codes() {
    let server = server_with(RecordingClient::new());

    let parse = serde_json::to_value(server.handle_line("{not json").await.expect("reply"))
        .expect("encode");
    assert_eq!(parse["error"]["code"], -32700);

    let invalid = serde_json::to_value(
        server
            .handle_line(r#"{"jsonrpc":"2.0","id":3}"#)
            .await
            .expect("reply"),
    )
    .expect("encode");
    assert_eq!(invalid["error"]["code"], -32600);

    let old_version = roundtrip(
        &server,
        json!({"jsonrpc": "1.0", "id": 6, "method": "ping"}),
    )
    .await;
    assert_eq!(old_version["error"]["code"], -32600);

    let unknown = roundtrip(
        &server,
        json!({"jsonrpc": "2.0", "id": 4, "method": "resources/list"}),
    )
    .await;
    assert_eq!(unknown["error"]["code"], -32601);
    assert_eq!(unknown["id"], 4);

    let ping = roundtrip(&server, json!({"jsonrpc": "2.0", "id": 5, "method": "ping"})).await;
    assert_eq!(ping["result"], json!({}));
}

#[tokio::test]
async fn unknown_arguments_are_rejected_before_any_request() {
    let client = RecordingClient::new();
    let server = server_with(client.clone());
    let response = call_tool(
        &server,
        "annotations_list",
        json!({"website_id": "app-1", "sorce": "user"}),
    )
    .await;
    assert_eq!(response["error"]["code"], -32602);
    let message = response["error"]["message"].as_str().expect("message");
    assert!(message.contains("unknown field 'sorce'"));
    assert!(message.contains("source"));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn unknown_tool_is_invalid_params() {
    let server = server_with(RecordingClient::new());
    let response = call_tool(&server, "annotations_purge", json!({})).await;
    assert_eq!(response["error"]["code"], -32602);
    assert!(response["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .contains("Unknown tool"));
}

#[tokio::test]
async fn legacy_name_and_app_id_are_normalized() {
    let client = RecordingClient::new();
    client.route(
        "GET",
        &user_path(),
        json!({"data": [user_resource("u1", "2025-01-01", "note")], "meta": {"total": 1}}),
    );
    let server = server_with(client.clone());
    let response = call_tool(
        &server,
        "analytics_annotations_list",
        json!({"app_id": "app-1", "source": "user", "trace_id": "trace-9"}),
    )
    .await;

    let envelope = &response["result"]["structuredContent"];
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["tool"], "annotations_list");
    assert_eq!(envelope["invoked_as"], "analytics_annotations_list");
    assert_eq!(envelope["trace"]["trace_id"], "trace-9");
    assert_eq!(envelope["result"]["meta"]["total"], 1);
    assert_eq!(envelope["normalization"]["renamed"][0]["to"], "website_id");

    let text = response["result"]["content"][0]["text"]
        .as_str()
        .expect("text");
    let decoded: Value = serde_json::from_str(text).expect("json text");
    assert_eq!(&decoded, envelope);

    assert_eq!(client.calls()[0].param("website_id"), Some("app-1"));
}

#[tokio::test]
async fn denied_delete_maps_to_invalid_request() {
    let client = RecordingClient::new();
    client.route(
        "GET",
        &item_path("sys-1"),
        json!({"data": system_resource("sys-1", "2025-01-01", "platform")}),
    );
    let server = server_with(client.clone());
    let response = call_tool(
        &server,
        "annotations_delete",
        json!({"id": "sys-1", "website_id": "app-1"}),
    )
    .await;
    assert_eq!(response["error"]["code"], -32600);
    let message = response["error"]["message"].as_str().expect("message");
    assert!(message.contains("code: DENIED"));
    assert!(message.contains("retryable: false"));
    assert!(client.calls_with_method("DELETE").is_empty());
}
