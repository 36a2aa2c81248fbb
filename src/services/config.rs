use crate::constants::{env, network::TIMEOUT_API_REQUEST_MS, protocols::ALLOWED_HTTP};
use crate::errors::ToolError;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Connection settings for the analytics API.
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(
        host: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, ToolError> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.trim().is_empty() {
            return Err(ToolError::invalid_params("client_id must be a non-empty string"));
        }
        if client_secret.trim().is_empty() {
            return Err(ToolError::invalid_params(
                "client_secret must be a non-empty string",
            ));
        }
        Ok(Self {
            base_url: normalize_base_url(host)?,
            client_id: client_id.trim().to_string(),
            client_secret,
            timeout: Duration::from_millis(TIMEOUT_API_REQUEST_MS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_env() -> Result<Self, ToolError> {
        let host = required_env(env::HOST)?;
        let client_id = required_env(env::CLIENT_ID)?;
        let client_secret = required_env(env::CLIENT_SECRET)?;
        let mut config = Self::new(&host, client_id, client_secret)?;
        if let Ok(raw) = std::env::var(env::TIMEOUT_MS) {
            let ms = raw.trim().parse::<u64>().map_err(|_| {
                ToolError::invalid_params(format!(
                    "{} must be a positive integer (milliseconds)",
                    env::TIMEOUT_MS
                ))
            })?;
            if ms > 0 {
                config.timeout = Duration::from_millis(ms);
            }
        }
        Ok(config)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn required_env(key: &str) -> Result<String, ToolError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(
            ToolError::invalid_params(format!("{} is not set", key)).with_hint(format!(
                "Export {}, {} and {} before starting the server.",
                env::HOST,
                env::CLIENT_ID,
                env::CLIENT_SECRET
            )),
        ),
    }
}

/// Accepts either a bare host (`example.piwik.pro`) or a full URL.
pub fn normalize_base_url(raw: &str) -> Result<Url, ToolError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ToolError::invalid_params("host must be a non-empty string"));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let parsed =
        Url::parse(&candidate).map_err(|_| ToolError::invalid_params("Invalid host URL"))?;
    let scheme = format!("{}:", parsed.scheme());
    if !ALLOWED_HTTP.contains(&scheme.as_str()) {
        return Err(ToolError::invalid_params(
            "Only http/https URLs are supported",
        ));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https_scheme() {
        let url = normalize_base_url("acme.piwik.pro").expect("url");
        assert_eq!(url.as_str(), "https://acme.piwik.pro/");
    }

    #[test]
    fn full_url_is_kept() {
        let url = normalize_base_url("http://127.0.0.1:8080/").expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(normalize_base_url("ftp://acme").is_err());
        assert!(normalize_base_url("  ").is_err());
    }

    #[test]
    fn debug_output_hides_secret() {
        let config = ClientConfig::new("acme.piwik.pro", "id", "super-secret").expect("config");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn empty_credentials_are_rejected() {
        assert!(ClientConfig::new("acme.piwik.pro", " ", "secret").is_err());
        assert!(ClientConfig::new("acme.piwik.pro", "id", "").is_err());
    }
}
