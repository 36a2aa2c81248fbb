use crate::errors::ToolError;
use serde_json::Value;

#[derive(Clone)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(
        &self,
        value: &Value,
        label: &str,
        trim: bool,
    ) -> Result<String, ToolError> {
        let text = value.as_str().ok_or_else(|| {
            ToolError::invalid_params(format!("{} must be a non-empty string", label))
        })?;
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(ToolError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(if trim {
            normalized.to_string()
        } else {
            text.to_string()
        })
    }

    pub fn ensure_optional_string(
        &self,
        value: Option<&Value>,
        label: &str,
        trim: bool,
    ) -> Result<Option<String>, ToolError> {
        match value {
            None => Ok(None),
            Some(val) if val.is_null() => Ok(None),
            Some(val) => self.ensure_string(val, label, trim).map(Some),
        }
    }

    /// Identifiers end up in URL paths and query strings.
    pub fn ensure_identifier(&self, value: Option<&Value>, label: &str) -> Result<String, ToolError> {
        let text = self.ensure_string(value.unwrap_or(&Value::Null), label, true)?;
        if text.contains(&['/', '?', '#', '\0'][..]) {
            return Err(ToolError::invalid_params(format!(
                "{} must not contain '/', '?', '#' or null bytes",
                label
            )));
        }
        let segment = text.to_ascii_lowercase().replace("%2e", ".");
        if segment == "." || segment == ".." {
            return Err(ToolError::invalid_params(format!(
                "{} must not be a dot segment",
                label
            )));
        }
        Ok(text)
    }

    /// Accepts a list of date strings or a single date string (wrapped into a
    /// one-element list). Dates are passed through unparsed.
    pub fn ensure_date_list(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<Vec<String>>, ToolError> {
        let Some(value) = value else {
            return Ok(None);
        };
        match value {
            Value::Null => Ok(None),
            Value::String(_) => Ok(Some(vec![self.ensure_string(value, label, true)?])),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| self.ensure_string(item, &format!("{}[{}]", label, idx), true))
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            _ => Err(ToolError::invalid_params(format!(
                "{} must be a date string or a list of date strings",
                label
            ))),
        }
    }

    pub fn ensure_non_negative_int(
        &self,
        value: Option<&Value>,
        label: &str,
        fallback: u64,
    ) -> Result<u64, ToolError> {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return Ok(fallback);
        };
        value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse::<u64>().ok()))
            .ok_or_else(|| {
                ToolError::invalid_params(format!("{} must be a non-negative integer", label))
            })
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}
