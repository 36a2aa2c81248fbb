use serde_json::{Map, Value};

/// Shapes the executor payload (`{ok, result, meta}`) into the envelope
/// returned by `tools/call`.
pub fn build_envelope(payload: &Value, normalization: Option<Value>) -> Value {
    let meta = payload.get("meta");
    let field = |key: &str| {
        meta.and_then(|m| m.get(key))
            .cloned()
            .unwrap_or(Value::Null)
    };

    let mut envelope = Map::new();
    envelope.insert(
        "success".to_string(),
        Value::Bool(payload.get("ok").and_then(|v| v.as_bool()).unwrap_or(true)),
    );
    envelope.insert("tool".to_string(), field("tool"));
    if let Some(invoked_as) = meta
        .and_then(|m| m.get("invoked_as"))
        .filter(|v| !v.is_null())
    {
        envelope.insert("invoked_as".to_string(), invoked_as.clone());
    }
    envelope.insert(
        "result".to_string(),
        payload.get("result").cloned().unwrap_or(Value::Null),
    );
    envelope.insert(
        "duration_ms".to_string(),
        Value::from(
            meta.and_then(|m| m.get("duration_ms"))
                .and_then(|v| v.as_i64())
                .unwrap_or(0),
        ),
    );
    envelope.insert(
        "trace".to_string(),
        serde_json::json!({
            "trace_id": field("trace_id"),
            "span_id": field("span_id"),
        }),
    );
    if let Some(normalization) = normalization {
        envelope.insert("normalization".to_string(), normalization);
    }
    Value::Object(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_lifts_meta_fields() {
        let payload = json!({
            "ok": true,
            "result": {"data": null},
            "meta": {
                "tool": "annotations_get",
                "trace_id": "t-1",
                "span_id": "s-1",
                "duration_ms": 12,
                "invoked_as": null
            }
        });
        let envelope = build_envelope(&payload, None);
        assert_eq!(
            envelope,
            json!({
                "success": true,
                "tool": "annotations_get",
                "result": {"data": null},
                "duration_ms": 12,
                "trace": {"trace_id": "t-1", "span_id": "s-1"}
            })
        );
    }

    #[test]
    fn envelope_reports_alias_and_normalization() {
        let payload = json!({
            "ok": true,
            "result": null,
            "meta": {"tool": "annotations_delete", "invoked_as": "analytics_annotations_delete"}
        });
        let envelope = build_envelope(
            &payload,
            Some(json!({"renamed": [{"from": "id", "to": "annotation_id"}]})),
        );
        assert_eq!(envelope["invoked_as"], "analytics_annotations_delete");
        assert_eq!(envelope["normalization"]["renamed"][0]["from"], "id");
        assert_eq!(envelope["duration_ms"], 0);
    }
}
