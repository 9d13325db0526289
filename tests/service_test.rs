//! Integration tests for MCP dispatch.
//!
//! These tests connect an rmcp client to the service over an in-memory duplex
//! pipe, so requests go through the real JSON-RPC framing, parameter decoding
//! and tool routing before reaching the fake QuestDB.

mod common;

use axum::http::StatusCode;
use common::{FakeQuestDb, Reply};
use questdb_mcp_server::mcp::{ProtocolLogger, QuestDbService};
use rmcp::model::{CallToolRequestParam, CallToolResult, ErrorCode};
use rmcp::service::RunningService;
use rmcp::{RoleClient, ServiceError, ServiceExt};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

async fn connect(fake: &FakeQuestDb) -> RunningService<RoleClient, ()> {
    let (server_io, client_io) = tokio::io::duplex(4096);
    let service = QuestDbService::new(Arc::new(fake.client()), Arc::new(ProtocolLogger::new()));

    tokio::spawn(async move {
        if let Ok(running) = service.serve(server_io).await {
            let _ = running.waiting().await;
        }
    });

    ().serve(client_io).await.unwrap()
}

fn request(value: JsonValue) -> CallToolRequestParam {
    serde_json::from_value(value).unwrap()
}

fn text_of(result: &CallToolResult) -> String {
    result.content[0]
        .as_text()
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

/// Test that a client sees all four tools, each with an output schema.
#[tokio::test]
async fn test_lists_tools_with_output_schemas() {
    let fake = FakeQuestDb::start().await;
    let client = connect(&fake).await;

    let tools = client.list_all_tools().await.unwrap();
    let mut names: Vec<String> = tools.iter().map(|t| t.name.to_string()).collect();
    names.sort();
    assert_eq!(names, vec!["describe_table", "insert", "list_tables", "query"]);
    for tool in &tools {
        assert!(tool.output_schema.is_some(), "{}", tool.name);
    }

    client.cancel().await.unwrap();
}

/// Test that a QuestDB 400 comes back as a tool result with isError set,
/// not as a protocol error.
#[tokio::test]
async fn test_server_error_stays_in_envelope() {
    let fake = FakeQuestDb::start().await;
    fake.reply_exec(Reply::new(
        StatusCode::BAD_REQUEST,
        r#"{"error":"table does not exist [table=nope]"}"#,
    ));
    let client = connect(&fake).await;

    let result = client
        .call_tool(request(json!({
            "name": "query",
            "arguments": {"query": "SELECT * FROM nope"}
        })))
        .await
        .unwrap();

    assert_eq!(result.is_error, Some(true));
    let text = text_of(&result);
    assert!(text.contains("400"), "{}", text);
    assert!(text.contains("table does not exist"), "{}", text);

    client.cancel().await.unwrap();
}

/// Test that arguments missing a required field are refused with
/// `invalid_params` before any request reaches QuestDB.
#[tokio::test]
async fn test_missing_argument_is_invalid_params() {
    let fake = FakeQuestDb::start().await;
    let client = connect(&fake).await;

    let err = client
        .call_tool(request(json!({
            "name": "query",
            "arguments": {"format": "csv"}
        })))
        .await
        .unwrap_err();

    match err {
        ServiceError::McpError(e) => assert_eq!(e.code, ErrorCode::INVALID_PARAMS),
        other => panic!("expected invalid params, got {:?}", other),
    }
    assert!(fake.requests().is_empty());

    client.cancel().await.unwrap();
}

/// Test that a successful call carries structured content through the wire.
#[tokio::test]
async fn test_list_tables_round_trip() {
    let fake = FakeQuestDb::start().await;
    fake.reply_exec(Reply::json(json!({
        "dataset": [["sensors"], ["trades"]],
        "count": 2
    })));
    let client = connect(&fake).await;

    let result = client
        .call_tool(request(json!({"name": "list_tables"})))
        .await
        .unwrap();

    assert_ne!(result.is_error, Some(true));
    let structured = result.structured_content.unwrap();
    assert_eq!(structured["tables"], json!(["sensors", "trades"]));
    assert_eq!(structured["count"], 2);

    client.cancel().await.unwrap();
}
