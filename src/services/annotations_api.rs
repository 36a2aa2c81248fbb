//! Resource client for the annotation endpoints of the analytics API.
//!
//! One method per REST operation. Bodies and query strings are built here;
//! transport errors are passed through untouched.

use crate::constants::annotations::USER_TYPE;
use crate::constants::endpoints::{SYSTEM_ANNOTATIONS_BASE, USER_ANNOTATIONS_BASE};
use crate::errors::ToolError;
use crate::models::{AnnotationListResponse, AnnotationSingleResponse};
use crate::services::http_client::{HttpClient, QueryParams};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Optional filters shared by both list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub date_from: Option<Vec<String>>,
    pub date_to: Option<Vec<String>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ListFilter {
    fn apply(&self, params: &mut QueryParams) {
        params
            .push_opt("limit", self.limit)
            .push_opt("offset", self.offset)
            .push_all("date_from", self.date_from.as_deref())
            .push_all("date_to", self.date_to.as_deref());
    }
}

#[derive(Clone)]
pub struct AnnotationsApi {
    client: Arc<dyn HttpClient>,
}

impl AnnotationsApi {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    pub async fn create_user_annotation(
        &self,
        website_id: &str,
        content: &str,
        date: &str,
        visibility: Option<&str>,
    ) -> Result<AnnotationSingleResponse, ToolError> {
        let body = build_user_annotation_body(None, website_id, content, date, visibility);
        let response = self.client.post(&user_collection_path(), &body).await?;
        decode(response, "create_user_annotation")
    }

    pub async fn list_user_annotations(
        &self,
        website_id: &str,
        filter: &ListFilter,
    ) -> Result<AnnotationListResponse, ToolError> {
        let mut params = QueryParams::new();
        params.push("website_id", website_id);
        filter.apply(&mut params);
        let response = self.client.get(&user_collection_path(), &params).await?;
        decode(response, "list_user_annotations")
    }

    pub async fn list_system_annotations(
        &self,
        filter: &ListFilter,
    ) -> Result<AnnotationListResponse, ToolError> {
        let mut params = QueryParams::new();
        filter.apply(&mut params);
        let path = format!("{}/", SYSTEM_ANNOTATIONS_BASE);
        let response = self.client.get(&path, &params).await?;
        decode(response, "list_system_annotations")
    }

    pub async fn get_user_annotation(
        &self,
        annotation_id: &str,
        website_id: &str,
    ) -> Result<AnnotationSingleResponse, ToolError> {
        let mut params = QueryParams::new();
        params.push("website_id", website_id);
        let response = self
            .client
            .get(&user_item_path(annotation_id), &params)
            .await?;
        decode(response, "get_user_annotation")
    }

    /// Expects 204; whatever body comes back is dropped.
    pub async fn delete_user_annotation(
        &self,
        annotation_id: &str,
        website_id: &str,
    ) -> Result<(), ToolError> {
        let mut params = QueryParams::new();
        params.push("website_id", website_id);
        self.client
            .delete(&user_item_path(annotation_id), &params)
            .await?;
        Ok(())
    }

    pub async fn update_user_annotation(
        &self,
        annotation_id: &str,
        website_id: &str,
        content: &str,
        date: &str,
        visibility: Option<&str>,
    ) -> Result<AnnotationSingleResponse, ToolError> {
        let body =
            build_user_annotation_body(Some(annotation_id), website_id, content, date, visibility);
        let response = self
            .client
            .patch(&user_item_path(annotation_id), &body)
            .await?;
        decode(response, "update_user_annotation")
    }
}

fn user_collection_path() -> String {
    format!("{}/", USER_ANNOTATIONS_BASE)
}

fn user_item_path(annotation_id: &str) -> String {
    format!("{}/{}/", USER_ANNOTATIONS_BASE, annotation_id)
}

/// JSON:API document for create (no id) and update (with id).
pub fn build_user_annotation_body(
    annotation_id: Option<&str>,
    website_id: &str,
    content: &str,
    date: &str,
    visibility: Option<&str>,
) -> Value {
    let mut attributes = Map::new();
    attributes.insert("website_id".to_string(), json!(website_id));
    attributes.insert("content".to_string(), json!(content));
    attributes.insert("date".to_string(), json!(date));
    if let Some(visibility) = visibility {
        attributes.insert("visibility".to_string(), json!(visibility));
    }

    let mut data = Map::new();
    data.insert("type".to_string(), json!(USER_TYPE));
    if let Some(id) = annotation_id {
        data.insert("id".to_string(), json!(id));
    }
    data.insert("attributes".to_string(), Value::Object(attributes));
    json!({ "data": data })
}

fn decode<T: DeserializeOwned + Default>(
    response: Option<Value>,
    operation: &str,
) -> Result<T, ToolError> {
    match response {
        None | Some(Value::Null) => Ok(T::default()),
        Some(Value::Object(map)) if map.is_empty() => Ok(T::default()),
        Some(value) => serde_json::from_value(value).map_err(|err| {
            ToolError::invalid_response(format!(
                "Unexpected response shape from {}: {}",
                operation, err
            ))
        }),
    }
}
