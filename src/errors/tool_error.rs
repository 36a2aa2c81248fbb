use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidParams,
    Denied,
    NotFound,
    Conflict,
    Timeout,
    Retryable,
    /// The vendor answered with a non-success status.
    Upstream,
    Internal,
}

impl ToolErrorKind {
    /// Same name the kind serializes to.
    pub fn as_str(self) -> &'static str {
        match self {
            ToolErrorKind::InvalidParams => "invalid_params",
            ToolErrorKind::Denied => "denied",
            ToolErrorKind::NotFound => "not_found",
            ToolErrorKind::Conflict => "conflict",
            ToolErrorKind::Timeout => "timeout",
            ToolErrorKind::Retryable => "retryable",
            ToolErrorKind::Upstream => "upstream",
            ToolErrorKind::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub retryable: bool,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
            retryable: matches!(kind, ToolErrorKind::Timeout | ToolErrorKind::Retryable),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParams, "INVALID_PARAMS", message)
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Denied, "DENIED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, "NOT_FOUND", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, "TIMEOUT", message)
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Retryable, "RETRYABLE", message)
    }

    /// Non-success HTTP status from the vendor. 429 and 5xx are flagged as
    /// retryable for the caller; nothing here retries.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Upstream, "UPSTREAM_HTTP", message)
            .with_retryable(status == 429 || status >= 500)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, "INTERNAL", message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, "INVALID_RESPONSE", message)
    }

    /// HTTP status carried in `details.status`, when the error came from the vendor.
    pub fn status(&self) -> Option<u16> {
        self.details
            .as_ref()
            .and_then(|d| d.get("status"))
            .and_then(|v| v.as_u64())
            .map(|v| v as u16)
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ToolError::timeout("HTTP request timed out");
        }
        if err.is_decode() {
            return ToolError::invalid_response(format!("Failed to decode response: {}", err));
        }
        ToolError::retryable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_marks_throttling_and_server_errors_retryable() {
        assert!(ToolError::upstream(429, "slow down").retryable);
        assert!(ToolError::upstream(503, "unavailable").retryable);
        assert!(!ToolError::upstream(404, "missing").retryable);
        assert_eq!(ToolError::upstream(400, "bad").kind, ToolErrorKind::Upstream);
    }

    #[test]
    fn denied_is_not_retryable() {
        let err = ToolError::denied("nope");
        assert!(!err.retryable);
        assert_eq!(err.code, "DENIED");
    }

    #[test]
    fn status_reads_details() {
        let err = ToolError::upstream(404, "missing")
            .with_details(serde_json::json!({"status": 404}));
        assert_eq!(err.status(), Some(404));
        assert_eq!(ToolError::internal("x").status(), None);
    }

    #[test]
    fn kind_name_matches_serialized_form() {
        for kind in [
            ToolErrorKind::InvalidParams,
            ToolErrorKind::NotFound,
            ToolErrorKind::Upstream,
            ToolErrorKind::Retryable,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }
}
