#![allow(dead_code)]

use annotations_mcp::app::App;
use annotations_mcp::constants::endpoints::{SYSTEM_ANNOTATIONS_BASE, USER_ANNOTATIONS_BASE};
use annotations_mcp::errors::ToolError;
use annotations_mcp::services::http_client::{HttpClient, QueryParams};
use annotations_mcp::services::logger::{LogLevel, Logger};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub static ENV_LOCK: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

pub fn user_path() -> String {
    format!("{}/", USER_ANNOTATIONS_BASE)
}

pub fn system_path() -> String {
    format!("{}/", SYSTEM_ANNOTATIONS_BASE)
}

pub fn item_path(id: &str) -> String {
    format!("{}/{}/", USER_ANNOTATIONS_BASE, id)
}

pub fn quiet_logger() -> Logger {
    Logger::with_level("test", LogLevel::Error)
}

pub fn app_with(client: Arc<dyn HttpClient>) -> App {
    App::with_client(quiet_logger(), client).expect("app wiring")
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub params: QueryParams,
    pub body: Option<Value>,
}

impl RecordedCall {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }
}

/// Records every call and answers from a fixed route table. Unrouted calls
/// get an empty body.
#[derive(Default)]
pub struct RecordingClient {
    calls: Mutex<Vec<RecordedCall>>,
    routes: Mutex<Vec<(&'static str, String, Result<Option<Value>, ToolError>)>>,
}

impl RecordingClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, method: &'static str, path: &str, response: Value) {
        self.routes
            .lock()
            .unwrap()
            .push((method, path.to_string(), Ok(Some(response))));
    }

    pub fn route_error(&self, method: &'static str, path: &str, error: ToolError) {
        self.routes
            .lock()
            .unwrap()
            .push((method, path.to_string(), Err(error)));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_with_method(&self, method: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method)
            .collect()
    }

    fn record(
        &self,
        method: &'static str,
        path: &str,
        params: QueryParams,
        body: Option<Value>,
    ) -> Result<Option<Value>, ToolError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            params,
            body,
        });
        self.routes
            .lock()
            .unwrap()
            .iter()
            .find(|(m, p, _)| *m == method && p == path)
            .map(|(_, _, response)| response.clone())
            .unwrap_or(Ok(None))
    }
}

#[async_trait]
impl HttpClient for RecordingClient {
    async fn get(&self, path: &str, params: &QueryParams) -> Result<Option<Value>, ToolError> {
        self.record("GET", path, params.clone(), None)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Option<Value>, ToolError> {
        self.record("POST", path, QueryParams::new(), Some(body.clone()))
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Option<Value>, ToolError> {
        self.record("PATCH", path, QueryParams::new(), Some(body.clone()))
    }

    async fn delete(&self, path: &str, params: &QueryParams) -> Result<Option<Value>, ToolError> {
        self.record("DELETE", path, params.clone(), None)
    }
}

pub fn user_resource(id: &str, date: &str, content: &str) -> Value {
    json!({
        "type": "UserAnnotation",
        "id": id,
        "attributes": {
            "date": date,
            "content": content,
            "visibility": "private",
            "website_id": "app-1",
            "author": {"email": "owner@example.com"},
            "is_author": true
        }
    })
}

pub fn system_resource(id: &str, date: &str, content: &str) -> Value {
    json!({
        "type": "SystemAnnotation",
        "id": id,
        "attributes": {"date": date, "content": content}
    })
}

/// Minimal in-memory stand-in for the annotations API: user annotations per
/// website plus a fixed list of system annotations.
pub struct FakeVendor {
    user: Mutex<BTreeMap<String, (String, Value)>>,
    system: Vec<Value>,
    next_id: Mutex<u64>,
}

impl FakeVendor {
    pub fn new(system: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            user: Mutex::new(BTreeMap::new()),
            system,
            next_id: Mutex::new(1),
        })
    }

    pub fn user_count(&self) -> usize {
        self.user.lock().unwrap().len()
    }

    fn item_id(path: &str) -> Option<String> {
        path.strip_prefix(&format!("{}/", USER_ANNOTATIONS_BASE))?
            .strip_suffix('/')
            .filter(|id| !id.is_empty())
            .map(|id| id.to_string())
    }

    fn store(&self, id: &str, body: &Value) -> Value {
        let mut attributes = body["data"]["attributes"].clone();
        let website_id = attributes["website_id"].as_str().unwrap_or("").to_string();
        attributes["is_author"] = json!(true);
        let resource = json!({"type": "UserAnnotation", "id": id, "attributes": attributes});
        self.user
            .lock()
            .unwrap()
            .insert(id.to_string(), (website_id, resource.clone()));
        json!({ "data": resource })
    }

    fn not_found(path: &str) -> ToolError {
        ToolError::upstream(404, format!("GET {} failed with status 404", path))
            .with_details(json!({"status": 404, "path": path}))
    }
}

#[async_trait]
impl HttpClient for FakeVendor {
    async fn get(&self, path: &str, params: &QueryParams) -> Result<Option<Value>, ToolError> {
        if path == system_path() {
            let total = self.system.len();
            return Ok(Some(json!({"data": self.system, "meta": {"total": total}})));
        }
        let website_id = params.get("website_id").unwrap_or("");
        if path == user_path() {
            let data: Vec<Value> = self
                .user
                .lock()
                .unwrap()
                .values()
                .filter(|(site, _)| site == website_id)
                .map(|(_, resource)| resource.clone())
                .collect();
            let total = data.len();
            return Ok(Some(json!({"meta": {"total": total}, "data": data})));
        }
        let id = Self::item_id(path).ok_or_else(|| Self::not_found(path))?;
        if let Some(system) = self.system.iter().find(|s| s["id"] == id.as_str()) {
            return Ok(Some(json!({ "data": system })));
        }
        let store = self.user.lock().unwrap();
        match store.get(&id) {
            Some((site, resource)) if site == website_id => {
                Ok(Some(json!({ "data": resource })))
            }
            _ => Err(Self::not_found(path)),
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Option<Value>, ToolError> {
        assert_eq!(path, user_path());
        let id = {
            let mut next = self.next_id.lock().unwrap();
            let id = format!("00000000-0000-4000-8000-{:012}", *next);
            *next += 1;
            id
        };
        Ok(Some(self.store(&id, body)))
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Option<Value>, ToolError> {
        let id = Self::item_id(path).ok_or_else(|| Self::not_found(path))?;
        if !self.user.lock().unwrap().contains_key(&id) {
            return Err(Self::not_found(path));
        }
        Ok(Some(self.store(&id, body)))
    }

    async fn delete(&self, path: &str, _params: &QueryParams) -> Result<Option<Value>, ToolError> {
        let id = Self::item_id(path).ok_or_else(|| Self::not_found(path))?;
        match self.user.lock().unwrap().remove(&id) {
            Some(_) => Ok(None),
            None => Err(Self::not_found(path)),
        }
    }
}
