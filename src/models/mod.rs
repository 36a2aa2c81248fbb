mod annotation;
mod tool_output;

pub use annotation::{
    AnnotationAuthor, AnnotationKind, AnnotationListResponse, AnnotationResource,
    AnnotationSingleResponse, Meta, SystemAnnotationAttributes, UserAnnotationAttributes,
};
pub use tool_output::{AnnotationItem, AnnotationSource, AnnotationsList, ListMeta};
