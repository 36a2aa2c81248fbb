//! Vendor-side annotation records, shaped after the JSON:API envelope the
//! analytics API returns.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::annotations::{SYSTEM_TYPE, USER_TYPE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationAuthor {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnnotationAttributes {
    pub date: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AnnotationAuthor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_author: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemAnnotationAttributes {
    pub date: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationKind {
    UserAnnotation,
    SystemAnnotation,
}

impl AnnotationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationKind::UserAnnotation => USER_TYPE,
            AnnotationKind::SystemAnnotation => SYSTEM_TYPE,
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single annotation, discriminated by the JSON:API `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnnotationResource {
    UserAnnotation {
        id: String,
        attributes: UserAnnotationAttributes,
    },
    SystemAnnotation {
        id: String,
        attributes: SystemAnnotationAttributes,
    },
}

impl AnnotationResource {
    pub fn id(&self) -> &str {
        match self {
            AnnotationResource::UserAnnotation { id, .. } => id,
            AnnotationResource::SystemAnnotation { id, .. } => id,
        }
    }

    pub fn kind(&self) -> AnnotationKind {
        match self {
            AnnotationResource::UserAnnotation { .. } => AnnotationKind::UserAnnotation,
            AnnotationResource::SystemAnnotation { .. } => AnnotationKind::SystemAnnotation,
        }
    }

    pub fn date(&self) -> &str {
        match self {
            AnnotationResource::UserAnnotation { attributes, .. } => &attributes.date,
            AnnotationResource::SystemAnnotation { attributes, .. } => &attributes.date,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            AnnotationResource::UserAnnotation { attributes, .. } => &attributes.content,
            AnnotationResource::SystemAnnotation { attributes, .. } => &attributes.content,
        }
    }

    pub fn is_system(&self) -> bool {
        self.kind() == AnnotationKind::SystemAnnotation
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub total: u64,
}

/// `{"data": {...}}`. An empty body decodes to `data: None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSingleResponse {
    #[serde(default)]
    pub data: Option<AnnotationResource>,
}

/// `{"data": [...], "meta": {"total": N}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationListResponse {
    #[serde(default)]
    pub data: Vec<AnnotationResource>,
    #[serde(default)]
    pub meta: Meta,
}
