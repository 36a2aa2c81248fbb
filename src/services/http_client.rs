use crate::constants::endpoints::AUTH_TOKEN;
use crate::constants::network::{
    JSON_API_MEDIA_TYPE, MAX_ERROR_BODY_BYTES, TOKEN_EXPIRY_BUFFER_MS,
};
use crate::errors::ToolError;
use crate::services::config::ClientConfig;
use crate::services::logger::Logger;
use crate::utils::redact::redact_text;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use url::Url;

/// Ordered query pairs. A key may repeat, which is how list filters such as
/// `date_from` are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn push_opt<T: ToString>(&mut self, key: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    pub fn push_all(&mut self, key: &str, values: Option<&[String]>) -> &mut Self {
        for value in values.unwrap_or_default() {
            self.push(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Transport used by the resource client. Each call returns the decoded JSON
/// body, `None` when the response had no body (204), and an error for any
/// non-success status.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, path: &str, params: &QueryParams) -> Result<Option<Value>, ToolError>;
    async fn post(&self, path: &str, body: &Value) -> Result<Option<Value>, ToolError>;
    async fn patch(&self, path: &str, body: &Value) -> Result<Option<Value>, ToolError>;
    async fn delete(&self, path: &str, params: &QueryParams) -> Result<Option<Value>, ToolError>;
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: Option<Instant>,
}

/// `reqwest`-backed client authenticating with OAuth2 client credentials.
pub struct PiwikClient {
    logger: Logger,
    config: ClientConfig,
    http: Client,
    token_cache: Mutex<Option<CachedToken>>,
}

impl PiwikClient {
    pub fn new(logger: Logger, config: ClientConfig) -> Result<Self, ToolError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ToolError::internal(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self {
            logger: logger.child("http"),
            config,
            http,
            token_cache: Mutex::new(None),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    pub fn build_url(&self, path: &str, params: Option<&QueryParams>) -> Result<Url, ToolError> {
        let mut url = self
            .config
            .base_url
            .join(path)
            .map_err(|_| ToolError::invalid_params(format!("Invalid request path: {}", path)))?;
        if let Some(params) = params.filter(|p| !p.is_empty()) {
            let mut query = url.query_pairs_mut();
            for (key, value) in params.pairs() {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn cached_token(&self) -> Option<String> {
        let guard = self.token_cache.lock().ok()?;
        let entry = guard.as_ref()?;
        if let Some(expires_at) = entry.expires_at {
            if Instant::now() >= expires_at {
                return None;
            }
        }
        Some(entry.token.clone())
    }

    fn store_token(&self, token: &str, expires_in_secs: Option<u64>) {
        let expires_at = expires_in_secs.map(|secs| {
            let ttl_ms = secs.saturating_mul(1000).saturating_sub(TOKEN_EXPIRY_BUFFER_MS);
            Instant::now() + Duration::from_millis(ttl_ms)
        });
        if let Ok(mut guard) = self.token_cache.lock() {
            *guard = Some(CachedToken {
                token: token.to_string(),
                expires_at,
            });
        }
    }

    fn invalidate_token(&self) {
        if let Ok(mut guard) = self.token_cache.lock() {
            *guard = None;
        }
    }

    async fn access_token(&self) -> Result<String, ToolError> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let url = self.build_url(AUTH_TOKEN, None)?;
        let payload = serde_json::json!({
            "grant_type": "client_credentials",
            "client_id": self.config.client_id,
            "client_secret": self.config.client_secret,
        });
        let response = self.http.post(url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = self.redact_body(&text);
            self.logger.warn(
                "token request failed",
                Some(&serde_json::json!({"status": status.as_u16()})),
            );
            return Err(ToolError::upstream(
                status.as_u16(),
                format!("Token request failed ({})", status.as_u16()),
            )
            .with_hint("Check the client id and secret of the API client.")
            .with_details(serde_json::json!({
                "status": status.as_u16(),
                "path": AUTH_TOKEN,
                "body": body,
            })));
        }

        let token_payload: Value = response
            .json()
            .await
            .map_err(|_| ToolError::invalid_response("Token response is not valid JSON"))?;
        let token = token_payload
            .get("access_token")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ToolError::invalid_response("access_token missing in token response"))?
            .to_string();
        let expires_in = token_payload.get("expires_in").and_then(|v| v.as_u64());
        self.store_token(&token, expires_in);
        self.logger.debug(
            "access token refreshed",
            Some(&serde_json::json!({"expires_in": expires_in})),
        );
        Ok(token)
    }

    fn redact_body(&self, text: &str) -> String {
        let secrets = [self.config.client_secret.clone()];
        redact_text(text, MAX_ERROR_BODY_BYTES, Some(&secrets))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        params: Option<&QueryParams>,
        body: Option<&Value>,
    ) -> Result<Option<Value>, ToolError> {
        let token = self.access_token().await?;
        let url = self.build_url(path, params)?;
        let started = Instant::now();

        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&token)
            .header(ACCEPT, JSON_API_MEDIA_TYPE);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, JSON_API_MEDIA_TYPE)
                .body(body.to_string());
        }

        let response = request.send().await?;
        let status = response.status();
        self.logger.debug(
            &format!("{} {}", method, path),
            Some(&serde_json::json!({
                "status": status.as_u16(),
                "duration_ms": started.elapsed().as_millis() as u64,
            })),
        );

        if status == StatusCode::UNAUTHORIZED {
            self.invalidate_token();
        }

        let bytes = response.bytes().await?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            let body = self.redact_body(&text);
            self.logger.warn(
                &format!("{} {} failed", method, path),
                Some(&serde_json::json!({"status": status.as_u16(), "body": body})),
            );
            return Err(ToolError::upstream(
                status.as_u16(),
                format!(
                    "{} {} failed with status {}",
                    method,
                    path,
                    status.as_u16()
                ),
            )
            .with_details(serde_json::json!({
                "status": status.as_u16(),
                "method": method.as_str(),
                "path": path,
                "body": body,
            })));
        }

        if status == StatusCode::NO_CONTENT || bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(None);
        }
        let parsed: Value = serde_json::from_slice(&bytes).map_err(|err| {
            ToolError::invalid_response(format!(
                "{} {} returned invalid JSON: {}",
                method, path, err
            ))
        })?;
        Ok(Some(parsed))
    }
}

#[async_trait]
impl HttpClient for PiwikClient {
    async fn get(&self, path: &str, params: &QueryParams) -> Result<Option<Value>, ToolError> {
        self.send(Method::GET, path, Some(params), None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Option<Value>, ToolError> {
        self.send(Method::POST, path, None, Some(body)).await
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Option<Value>, ToolError> {
        self.send(Method::PATCH, path, None, Some(body)).await
    }

    async fn delete(&self, path: &str, params: &QueryParams) -> Result<Option<Value>, ToolError> {
        self.send(Method::DELETE, path, Some(params), None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PiwikClient {
        let config = ClientConfig::new("acme.piwik.pro", "id", "secret").expect("config");
        PiwikClient::new(Logger::new("test"), config).expect("client")
    }

    #[test]
    fn query_params_keep_repeated_keys_in_order() {
        let mut params = QueryParams::new();
        params
            .push("website_id", "app-1")
            .push_opt("limit", Some(10))
            .push_opt::<u64>("offset", None)
            .push_all(
                "date_from",
                Some(["2024-01-01".to_string(), "2024-02-01".to_string()].as_slice()),
            );
        assert_eq!(params.get("website_id"), Some("app-1"));
        assert_eq!(params.get("limit"), Some("10"));
        assert!(!params.contains_key("offset"));
        assert_eq!(params.get_all("date_from"), vec!["2024-01-01", "2024-02-01"]);
    }

    #[test]
    fn build_url_encodes_repeated_pairs() {
        let mut params = QueryParams::new();
        params.push("website_id", "app 1").push_all(
            "date_to",
            Some(["2024-01-31".to_string(), "2024-02-29".to_string()].as_slice()),
        );
        let url = client()
            .build_url("/api/analytics/v1/manage/annotation/user/", Some(&params))
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://acme.piwik.pro/api/analytics/v1/manage/annotation/user/?website_id=app+1&date_to=2024-01-31&date_to=2024-02-29"
        );
    }

    #[test]
    fn build_url_without_params_has_no_query() {
        let url = client()
            .build_url("/api/analytics/v1/manage/annotation/system/", Some(&QueryParams::new()))
            .expect("url");
        assert!(url.query().is_none());
    }

    #[test]
    fn token_cache_honours_expiry_buffer() {
        let client = client();
        client.store_token("short", Some(10));
        assert!(client.cached_token().is_none(), "10s token is inside the 30s buffer");
        client.store_token("long", Some(3600));
        assert_eq!(client.cached_token().as_deref(), Some("long"));
        client.invalidate_token();
        assert!(client.cached_token().is_none());
    }
}
