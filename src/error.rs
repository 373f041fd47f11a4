use crate::ast::NodeId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslateError {
    #[error("Unsupported construct: {0}")]
    UnsupportedConstruct(String),

    #[error("Field {field} not found in entity type {entity}")]
    FieldNotFound { field: String, entity: String },

    #[error("Unable to map type {source_type} to a primitive type: found {matches} matching types")]
    AmbiguousTypeMapping { source_type: String, matches: usize },

    #[error("No translation recorded for node {0}")]
    MissingTranslation(NodeId),
}

impl TranslateError {
    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedConstruct(message.into())
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;
