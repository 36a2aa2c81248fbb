use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::annotation::AnnotationResource;

/// Output of create/get/update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationItem {
    pub data: Option<AnnotationResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    /// Sum of the page sizes fetched from each source, not a server-side total.
    pub total: u64,
}

/// Output of `annotations_list`: user and system annotations merged by date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationsList {
    pub data: Vec<AnnotationResource>,
    pub meta: ListMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationSource {
    All,
    User,
    System,
}

impl AnnotationSource {
    pub fn includes_user(self) -> bool {
        matches!(self, AnnotationSource::All | AnnotationSource::User)
    }

    pub fn includes_system(self) -> bool {
        matches!(self, AnnotationSource::All | AnnotationSource::System)
    }
}

impl Default for AnnotationSource {
    fn default() -> Self {
        AnnotationSource::All
    }
}

impl FromStr for AnnotationSource {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "all" => Ok(AnnotationSource::All),
            "user" => Ok(AnnotationSource::User),
            "system" => Ok(AnnotationSource::System),
            other => Err(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_parsing_is_case_insensitive() {
        assert_eq!("ALL".parse::<AnnotationSource>(), Ok(AnnotationSource::All));
        assert_eq!(" User ".parse::<AnnotationSource>(), Ok(AnnotationSource::User));
        assert_eq!("system".parse::<AnnotationSource>(), Ok(AnnotationSource::System));
        assert_eq!(
            "sytem".parse::<AnnotationSource>(),
            Err("sytem".to_string())
        );
    }

    #[test]
    fn source_selection() {
        assert!(AnnotationSource::All.includes_user());
        assert!(AnnotationSource::All.includes_system());
        assert!(!AnnotationSource::User.includes_system());
        assert!(!AnnotationSource::System.includes_user());
    }
}
