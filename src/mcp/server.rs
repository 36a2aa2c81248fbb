use crate::app::App;
use crate::errors::{ErrorCode, McpError, ToolError, ToolErrorKind};
use crate::mcp::aliases::canonical_tool_name;
use crate::mcp::catalog::{list_tools, tool_by_name, validate_tool_args};
use crate::mcp::envelope::build_envelope;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::utils::arg_aliases::normalize_args_aliases;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

const PROTOCOL_VERSION: &str = "2025-06-18";
const SERVER_NAME: &str = "annotations-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn map_tool_error(tool: &str, error: &ToolError) -> McpError {
    let mut lines = vec![
        "AnnotationsError".to_string(),
        format!("tool: {}", tool),
        format!("kind: {}", error.kind.as_str()),
        format!("code: {}", error.code),
        format!("retryable: {}", error.retryable),
        format!("message: {}", error.message),
    ];
    if let Some(hint) = &error.hint {
        lines.push(format!("hint: {}", hint));
    }
    if let Some(status) = error.status() {
        lines.push(format!("status: {}", status));
    }
    let message = lines.join("\n");

    match error.kind {
        ToolErrorKind::InvalidParams => McpError::new(ErrorCode::InvalidParams, message),
        ToolErrorKind::Timeout => McpError::new(ErrorCode::RequestTimeout, message),
        ToolErrorKind::Denied | ToolErrorKind::Conflict | ToolErrorKind::NotFound => {
            McpError::new(ErrorCode::InvalidRequest, message)
        }
        _ => McpError::new(ErrorCode::InternalError, message),
    }
}

pub struct McpServer {
    app: Arc<App>,
}

impl McpServer {
    pub fn new(app: Arc<App>) -> Self {
        Self { app }
    }

    pub fn from_env() -> Result<Self, ToolError> {
        let app = App::initialize()?;
        Ok(Self::new(Arc::new(app)))
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
        })
    }

    fn handle_tools_list(&self) -> Value {
        serde_json::json!({ "tools": list_tools() })
    }

    async fn handle_tools_call(&self, name: &str, raw_args: Value) -> Result<Value, McpError> {
        let canonical_tool = canonical_tool_name(name);
        let args = if raw_args.is_null() {
            Value::Object(Default::default())
        } else {
            raw_args
        };

        let allowed_keys = tool_by_name(canonical_tool)
            .and_then(|tool| tool.input_schema.get("properties"))
            .and_then(|props| props.as_object())
            .map(|map| map.keys().cloned().collect::<HashSet<String>>());
        let (args, normalization) =
            normalize_args_aliases(&args, canonical_tool, allowed_keys.as_ref());

        validate_tool_args(canonical_tool, &args)?;

        let payload = self
            .app
            .tool_executor
            .execute(name, args)
            .await
            .map_err(|err| map_tool_error(name, &err))?;

        let envelope = build_envelope(&payload, normalization);
        let text = serde_json::to_string(&envelope)
            .map_err(|err| McpError::new(ErrorCode::InternalError, err.to_string()))?;
        Ok(serde_json::json!({
            "content": [ { "type": "text", "text": text } ],
            "structuredContent": envelope,
        }))
    }

    /// Handles one line of input. `None` means nothing is written back
    /// (blank lines and notifications).
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let parsed: Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::ParseError.as_i32(),
                    "Parse error".to_string(),
                ))
            }
        };

        let request = match serde_json::from_value::<JsonRpcRequest>(parsed) {
            Ok(req) if req.jsonrpc == "2.0" => req,
            _ => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::InvalidRequest.as_i32(),
                    "Invalid request".to_string(),
                ))
            }
        };

        let id = request.id.clone();
        match request.method.as_str() {
            method if method.starts_with("notifications/") => {
                id.map(|id| JsonRpcResponse::success(id, serde_json::json!({})))
            }
            "initialize" => id.map(|id| JsonRpcResponse::success(id, self.handle_initialize())),
            "ping" => id.map(|id| JsonRpcResponse::success(id, serde_json::json!({}))),
            "tools/list" => id.map(|id| JsonRpcResponse::success(id, self.handle_tools_list())),
            "tools/call" => {
                let id = id?;
                let params = request.params.as_object().cloned().unwrap_or_default();
                let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
                if name.is_empty() {
                    return Some(JsonRpcResponse::failure(
                        id,
                        ErrorCode::InvalidParams.as_i32(),
                        "Missing tool name".to_string(),
                    ));
                }
                let args = params.get("arguments").cloned().unwrap_or(Value::Null);
                Some(match self.handle_tools_call(name, args).await {
                    Ok(result) => JsonRpcResponse::success(id, result),
                    Err(err) => JsonRpcResponse::failure(id, err.code.as_i32(), err.message),
                })
            }
            method => id.map(|id| {
                let err = McpError::method_not_found(method);
                JsonRpcResponse::failure(id, err.code.as_i32(), err.message)
            }),
        }
    }

    pub async fn run_stdio(&self) -> Result<(), ToolError> {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin).lines();
        let mut writer = BufWriter::new(stdout);

        self.app.logger.info("listening on stdio", None);
        while let Some(line) = reader.next_line().await? {
            if let Some(response) = self.handle_line(&line).await {
                write_response(&mut writer, &response).await?;
            }
        }
        self.app.logger.info("stdin closed, shutting down", None);

        Ok(())
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> Result<(), ToolError> {
    let payload = serde_json::to_string(response)
        .map_err(|err| ToolError::internal(format!("Failed to encode response: {}", err)))?;
    writer.write_all(payload.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

pub async fn run_stdio() -> Result<(), ToolError> {
    let server = McpServer::from_env()?;
    server.run_stdio().await
}
