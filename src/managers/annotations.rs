use crate::constants::annotations::{
    DEFAULT_LIMIT, DEFAULT_OFFSET, DEFAULT_VISIBILITY, SOURCES,
};
use crate::errors::ToolError;
use crate::models::{
    AnnotationItem, AnnotationKind, AnnotationResource, AnnotationSource, AnnotationsList,
    ListMeta,
};
use crate::services::annotations_api::{AnnotationsApi, ListFilter};
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use crate::utils::suggest::suggest;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationTool {
    Create,
    List,
    Get,
    Update,
    Delete,
}

impl AnnotationTool {
    pub const ALL: [AnnotationTool; 5] = [
        AnnotationTool::Create,
        AnnotationTool::List,
        AnnotationTool::Get,
        AnnotationTool::Update,
        AnnotationTool::Delete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnnotationTool::Create => "annotations_create",
            AnnotationTool::List => "annotations_list",
            AnnotationTool::Get => "annotations_get",
            AnnotationTool::Update => "annotations_update",
            AnnotationTool::Delete => "annotations_delete",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAnnotation {
    pub website_id: String,
    pub content: String,
    pub date: String,
    pub visibility: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAnnotation {
    pub annotation_id: String,
    pub website_id: String,
    pub content: String,
    pub date: String,
    pub visibility: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRef {
    pub annotation_id: String,
    pub website_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListAnnotations {
    pub website_id: String,
    pub date_from: Option<Vec<String>>,
    pub date_to: Option<Vec<String>>,
    pub source: AnnotationSource,
    pub limit: u64,
    pub offset: u64,
}

impl ListAnnotations {
    pub fn new(website_id: impl Into<String>) -> Self {
        Self {
            website_id: website_id.into(),
            date_from: None,
            date_to: None,
            source: AnnotationSource::All,
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }

    fn filter(&self) -> ListFilter {
        ListFilter {
            date_from: self.date_from.clone(),
            date_to: self.date_to.clone(),
            limit: Some(self.limit),
            offset: Some(self.offset),
        }
    }
}

/// Tool-facing layer over [`AnnotationsApi`]: argument checks, the merged
/// list view and the system-annotation delete guard.
pub struct AnnotationsManager {
    logger: Logger,
    validation: Validation,
    api: AnnotationsApi,
}

impl AnnotationsManager {
    pub fn new(logger: Logger, validation: Validation, api: AnnotationsApi) -> Self {
        Self {
            logger: logger.child("annotations"),
            validation,
            api,
        }
    }

    pub async fn handle_tool(&self, tool: AnnotationTool, args: Value) -> Result<Value, ToolError> {
        match tool {
            AnnotationTool::Create => {
                let request = self.parse_create(&args)?;
                to_output(&self.create(&request).await?)
            }
            AnnotationTool::List => {
                let request = self.parse_list(&args)?;
                to_output(&self.list(&request).await?)
            }
            AnnotationTool::Get => {
                let request = self.parse_ref(&args)?;
                to_output(&self.get(&request).await?)
            }
            AnnotationTool::Update => {
                let request = self.parse_update(&args)?;
                to_output(&self.update(&request).await?)
            }
            AnnotationTool::Delete => {
                let request = self.parse_ref(&args)?;
                self.delete(&request).await?;
                Ok(Value::Null)
            }
        }
    }

    pub async fn create(&self, request: &CreateAnnotation) -> Result<AnnotationItem, ToolError> {
        let response = self
            .api
            .create_user_annotation(
                &request.website_id,
                &request.content,
                &request.date,
                Some(&request.visibility),
            )
            .await?;
        Ok(AnnotationItem {
            data: response.data,
        })
    }

    pub async fn list(&self, request: &ListAnnotations) -> Result<AnnotationsList, ToolError> {
        if let (Some(from), Some(to)) = (&request.date_from, &request.date_to) {
            if from.len() != to.len() {
                return Err(ToolError::invalid_params(format!(
                    "date_from and date_to must have the same number of items (got {} and {})",
                    from.len(),
                    to.len()
                ))
                .with_hint("Pass one date_to per date_from; each pair is one date range."));
            }
        }

        let filter = request.filter();
        let user = if request.source.includes_user() {
            self.api
                .list_user_annotations(&request.website_id, &filter)
                .await?
                .data
        } else {
            Vec::new()
        };
        let system = if request.source.includes_system() {
            self.api.list_system_annotations(&filter).await?.data
        } else {
            Vec::new()
        };

        Ok(merge_by_date_desc(user, system))
    }

    pub async fn get(&self, request: &AnnotationRef) -> Result<AnnotationItem, ToolError> {
        let response = self
            .api
            .get_user_annotation(&request.annotation_id, &request.website_id)
            .await?;
        Ok(AnnotationItem {
            data: response.data,
        })
    }

    pub async fn update(&self, request: &UpdateAnnotation) -> Result<AnnotationItem, ToolError> {
        let response = self
            .api
            .update_user_annotation(
                &request.annotation_id,
                &request.website_id,
                &request.content,
                &request.date,
                Some(&request.visibility),
            )
            .await?;
        Ok(AnnotationItem {
            data: response.data,
        })
    }

    /// Reads the annotation first and refuses to delete system annotations.
    /// The read and the delete are separate requests.
    pub async fn delete(&self, request: &AnnotationRef) -> Result<(), ToolError> {
        let current = self
            .api
            .get_user_annotation(&request.annotation_id, &request.website_id)
            .await?;
        let Some(resource) = current.data else {
            return Err(ToolError::not_found(format!(
                "Annotation {} was not returned by the API; nothing deleted",
                request.annotation_id
            )));
        };
        if resource.kind() == AnnotationKind::SystemAnnotation {
            self.logger.warn(
                "refusing to delete system annotation",
                Some(&serde_json::json!({
                    "annotation_id": request.annotation_id,
                    "website_id": request.website_id,
                })),
            );
            return Err(ToolError::denied(format!(
                "Annotation {} is a SystemAnnotation and cannot be deleted",
                request.annotation_id
            ))
            .with_hint("Only user annotations can be deleted.")
            .with_details(serde_json::json!({
                "annotation_id": request.annotation_id,
                "type": resource.kind().as_str(),
            })));
        }
        self.api
            .delete_user_annotation(&request.annotation_id, &request.website_id)
            .await
    }

    fn parse_create(&self, args: &Value) -> Result<CreateAnnotation, ToolError> {
        Ok(CreateAnnotation {
            website_id: self
                .validation
                .ensure_identifier(args.get("website_id"), "website_id")?,
            content: self.required_string(args, "content")?,
            date: self.required_string(args, "date")?,
            visibility: self.visibility(args)?,
        })
    }

    fn parse_update(&self, args: &Value) -> Result<UpdateAnnotation, ToolError> {
        let target = self.parse_ref(args)?;
        Ok(UpdateAnnotation {
            annotation_id: target.annotation_id,
            website_id: target.website_id,
            content: self.required_string(args, "content")?,
            date: self.required_string(args, "date")?,
            visibility: self.visibility(args)?,
        })
    }

    fn parse_ref(&self, args: &Value) -> Result<AnnotationRef, ToolError> {
        Ok(AnnotationRef {
            annotation_id: self
                .validation
                .ensure_identifier(args.get("annotation_id"), "annotation_id")?,
            website_id: self
                .validation
                .ensure_identifier(args.get("website_id"), "website_id")?,
        })
    }

    fn parse_list(&self, args: &Value) -> Result<ListAnnotations, ToolError> {
        let mut request = ListAnnotations::new(
            self.validation
                .ensure_identifier(args.get("website_id"), "website_id")?,
        );
        request.date_from = self
            .validation
            .ensure_date_list(args.get("date_from"), "date_from")?;
        request.date_to = self
            .validation
            .ensure_date_list(args.get("date_to"), "date_to")?;
        request.limit = self
            .validation
            .ensure_non_negative_int(args.get("limit"), "limit", DEFAULT_LIMIT)?;
        request.offset = self
            .validation
            .ensure_non_negative_int(args.get("offset"), "offset", DEFAULT_OFFSET)?;
        if let Some(raw) = self
            .validation
            .ensure_optional_string(args.get("source"), "source", true)?
        {
            request.source = parse_source(&raw)?;
        }
        Ok(request)
    }

    /// User-supplied values are sent as given; only blank strings are refused.
    fn required_string(&self, args: &Value, key: &str) -> Result<String, ToolError> {
        self.validation
            .ensure_string(args.get(key).unwrap_or(&Value::Null), key, false)
    }

    fn visibility(&self, args: &Value) -> Result<String, ToolError> {
        Ok(self
            .validation
            .ensure_optional_string(args.get("visibility"), "visibility", false)?
            .unwrap_or_else(|| DEFAULT_VISIBILITY.to_string()))
    }
}

fn parse_source(raw: &str) -> Result<AnnotationSource, ToolError> {
    raw.parse::<AnnotationSource>().map_err(|value| {
        let known: Vec<String> = SOURCES.iter().map(|s| s.to_string()).collect();
        let suggestions = suggest(&value, &known, 1);
        let mut hint = format!("Use one of: {}.", known.join(", "));
        if let Some(best) = suggestions.first() {
            hint = format!("Did you mean: {}? {}", best, hint);
        }
        ToolError::invalid_params(format!("Unknown source: {}", value)).with_hint(hint)
    })
}

/// Concatenates user then system annotations and sorts them newest first.
/// The sort is stable, so equal dates keep fetch order: user entries before
/// system entries, each in the order the API returned them. `meta.total` is
/// the number of merged items.
pub fn merge_by_date_desc(
    user: Vec<AnnotationResource>,
    system: Vec<AnnotationResource>,
) -> AnnotationsList {
    let mut data = user;
    data.extend(system);
    data.sort_by(|a, b| b.date().cmp(a.date()));
    let total = data.len() as u64;
    AnnotationsList {
        data,
        meta: ListMeta { total },
    }
}

fn to_output<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value)
        .map_err(|err| ToolError::internal(format!("Failed to encode tool output: {}", err)))
}

/// Binds one tool name to the shared manager.
pub struct AnnotationToolHandler {
    manager: Arc<AnnotationsManager>,
    tool: AnnotationTool,
}

impl AnnotationToolHandler {
    pub fn new(manager: Arc<AnnotationsManager>, tool: AnnotationTool) -> Self {
        Self { manager, tool }
    }
}

#[async_trait::async_trait]
impl ToolHandler for AnnotationToolHandler {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        self.manager.handle_tool(self.tool, args).await
    }
}
