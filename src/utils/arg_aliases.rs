use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Default)]
struct NormalizationState {
    renamed: Vec<Value>,
    ignored: Vec<Value>,
}

/// Argument spellings accepted on every annotation tool.
const SHARED_ARG_ALIASES: &[(&str, &str)] = &[
    ("app_id", "website_id"),
    ("appId", "website_id"),
    ("websiteId", "website_id"),
    ("dateFrom", "date_from"),
    ("dateTo", "date_to"),
];

/// Spellings only meaningful for tools addressing a single annotation.
const ITEM_ARG_ALIASES: &[(&str, &str)] = &[("id", "annotation_id"), ("annotationId", "annotation_id")];

fn addresses_single_annotation(tool: &str) -> bool {
    matches!(
        tool,
        "annotations_get" | "annotations_update" | "annotations_delete"
    )
}

fn rename_key(
    map: &mut Map<String, Value>,
    from_key: &str,
    to_key: &str,
    state: &mut NormalizationState,
    allowed_keys: Option<&HashSet<String>>,
) {
    if !map.contains_key(from_key) {
        return;
    }
    if let Some(allowed) = allowed_keys {
        if !allowed.contains(to_key) {
            return;
        }
    }
    if map.contains_key(to_key) {
        map.remove(from_key);
        state.ignored.push(serde_json::json!({
            "from": from_key,
            "to": to_key,
            "reason": "canonical_already_set",
        }));
        return;
    }
    if let Some(value) = map.remove(from_key) {
        map.insert(to_key.to_string(), value);
        state.renamed.push(serde_json::json!({
            "from": from_key,
            "to": to_key,
        }));
    }
}

fn compact_state(state: NormalizationState) -> Option<Value> {
    let mut out = Map::new();
    if !state.renamed.is_empty() {
        out.insert("renamed".to_string(), Value::Array(state.renamed));
    }
    if !state.ignored.is_empty() {
        out.insert("ignored".to_string(), Value::Array(state.ignored));
    }
    if out.is_empty() {
        None
    } else {
        Some(Value::Object(out))
    }
}

/// Rewrites alternate argument names to the canonical ones. Returns the
/// rewritten arguments and a report of what changed, if anything did. When
/// `allowed_keys` is given, a rename only happens if the target is one of them.
pub fn normalize_args_aliases(
    args: &Value,
    tool: &str,
    allowed_keys: Option<&HashSet<String>>,
) -> (Value, Option<Value>) {
    let Value::Object(map) = args else {
        return (args.clone(), None);
    };
    let mut out = map.clone();
    let mut state = NormalizationState::default();

    for (from, to) in SHARED_ARG_ALIASES {
        rename_key(&mut out, from, to, &mut state, allowed_keys);
    }
    if addresses_single_annotation(tool) {
        for (from, to) in ITEM_ARG_ALIASES {
            rename_key(&mut out, from, to, &mut state, allowed_keys);
        }
    }

    (Value::Object(out), compact_state(state))
}
