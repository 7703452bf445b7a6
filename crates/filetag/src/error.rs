use crate::entities::{FileId, TagId, ValueId};

#[derive(Debug, thiserror::Error)]
pub enum FiletagError {
    #[error("no such tag: {name}")]
    UnknownTag { name: String },

    #[error("no such value: {name}")]
    UnknownValue { name: String },

    #[error("unsupported query expression: {kind}")]
    UnsupportedExpression { kind: String },

    #[error("file {file} is not tagged {tag} with value {value:?}")]
    NoSuchFact {
        file: FileId,
        tag: TagId,
        value: Option<ValueId>,
    },

    #[error("Query parse error: {0}")]
    QueryParse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FiletagError>;

impl FiletagError {
    pub(crate) fn unknown_tag(name: &str) -> Self {
        Self::UnknownTag {
            name: name.to_string(),
        }
    }

    pub(crate) fn unknown_value(name: &str) -> Self {
        Self::UnknownValue {
            name: name.to_string(),
        }
    }

    pub(crate) fn unsupported(kind: &str) -> Self {
        Self::UnsupportedExpression {
            kind: kind.to_string(),
        }
    }
}
