use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::utils::redact::redact_object;
use crate::utils::suggest::suggest;

use serde_json::Value;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: Value) -> Result<Value, ToolError>;
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
    alias_map: HashMap<String, String>,
}

#[derive(Clone)]
pub(crate) struct ToolCallMeta {
    pub started_at: i64,
    pub trace_id: String,
    pub span_id: String,
    pub invoked_as: Option<String>,
}

/// Keys consumed by the executor and never forwarded to a handler.
const CALL_META_FIELDS: &[&str] = &["trace_id", "span_id", "parent_span_id"];

impl ToolExecutor {
    pub fn new(
        logger: Logger,
        handlers: HashMap<String, Arc<dyn ToolHandler>>,
        alias_map: HashMap<String, String>,
    ) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
            alias_map,
        }
    }

    fn resolve_alias(&self, tool: &str) -> (String, Option<String>) {
        if self.handlers.contains_key(tool) {
            return (tool.to_string(), None);
        }
        if let Some(mapped) = self.alias_map.get(tool) {
            return (mapped.clone(), Some(tool.to_string()));
        }
        (tool.to_string(), None)
    }

    fn strip_args_for_handler(&self, args: &Value) -> Value {
        let mut cleaned = args.clone();
        if let Value::Object(map) = &mut cleaned {
            for key in CALL_META_FIELDS {
                map.remove(*key);
            }
        }
        cleaned
    }

    fn unknown_tool_error(&self, tool: &str) -> ToolError {
        let candidates: Vec<String> = self
            .handlers
            .keys()
            .cloned()
            .chain(self.alias_map.keys().cloned())
            .collect();
        let suggestions = suggest(tool, &candidates, 3);
        let hint = if suggestions.is_empty() {
            "Call tools/list to see the available tools".to_string()
        } else {
            format!("Did you mean: {}?", suggestions.join(", "))
        };
        ToolError::invalid_params(format!("Unknown tool: {}", tool)).with_hint(hint)
    }

    pub(crate) fn wrap_result(&self, tool: &str, result: Value, meta: ToolCallMeta) -> Value {
        let ToolCallMeta {
            started_at,
            trace_id,
            span_id,
            invoked_as,
        } = meta;
        serde_json::json!({
            "ok": true,
            "result": result,
            "meta": {
                "tool": tool,
                "trace_id": trace_id,
                "span_id": span_id,
                "duration_ms": chrono::Utc::now().timestamp_millis() - started_at,
                "invoked_as": invoked_as,
            },
        })
    }

    pub async fn execute(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        let started_at = chrono::Utc::now().timestamp_millis();
        let (resolved_tool, invoked_as) = self.resolve_alias(tool);
        let Some(handler) = self.handlers.get(&resolved_tool) else {
            return Err(self.unknown_tool_error(tool));
        };

        let trace_id = args
            .get("trace_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let span_id = args
            .get("span_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        self.logger.debug(
            &resolved_tool,
            Some(&serde_json::json!({
                "trace_id": trace_id,
                "args": redact_object(&self.strip_args_for_handler(&args), 256),
            })),
        );

        let result = match handler.handle(self.strip_args_for_handler(&args)).await {
            Ok(result) => result,
            Err(err) => {
                self.logger.warn(
                    &format!("{} failed", resolved_tool),
                    Some(&serde_json::json!({
                        "trace_id": trace_id,
                        "kind": err.kind,
                        "code": err.code,
                        "message": err.message,
                        "duration_ms": chrono::Utc::now().timestamp_millis() - started_at,
                    })),
                );
                return Err(err);
            }
        };

        let payload = self.wrap_result(
            &resolved_tool,
            result,
            ToolCallMeta {
                started_at,
                trace_id,
                span_id,
                invoked_as,
            },
        );
        self.logger
            .info(&format!("{} ok", resolved_tool), payload.get("meta"));
        Ok(payload)
    }
}
