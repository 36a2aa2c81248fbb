use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Legacy tool names kept callable after the rename to `annotations_*`.
pub const BUILTIN_TOOL_ALIASES: &[(&str, &str)] = &[
    ("analytics_annotations_create", "annotations_create"),
    ("analytics_annotations_list", "annotations_list"),
    ("analytics_annotations_get", "annotations_get"),
    ("analytics_annotations_update", "annotations_update"),
    ("analytics_annotations_delete", "annotations_delete"),
];

static BUILTIN_TOOL_ALIAS_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| BUILTIN_TOOL_ALIASES.iter().copied().collect());

pub fn builtin_tool_aliases() -> &'static [(&'static str, &'static str)] {
    BUILTIN_TOOL_ALIASES
}

pub fn canonical_tool_name(tool: &str) -> &str {
    BUILTIN_TOOL_ALIAS_MAP.get(tool).copied().unwrap_or(tool)
}

pub fn builtin_tool_alias_map_owned() -> HashMap<String, String> {
    BUILTIN_TOOL_ALIASES
        .iter()
        .map(|(alias, target)| (alias.to_string(), target.to_string()))
        .collect()
}
