use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single violated constraint, addressed by its JSON field path
/// (for example `tasks[2].title`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum KanbanError {
    #[error("Not in a kanban project. Run 'kanban-auditor init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .kanban/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Ambiguous task id '{0}' matches more than one task")]
    AmbiguousTaskId(String),

    #[error("Validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, KanbanError>;
