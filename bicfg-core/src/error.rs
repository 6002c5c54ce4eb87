//! Core error types.

use thiserror::Error;

/// Errors from the configuration engine.
///
/// Only authoring and API calls return these. The evaluation path
/// (comparator, evaluator, effect applier) degrades missing references to
/// "inactive" or a no-op instead of failing.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid condition '{condition}': {reason}")]
    InvalidCondition { condition: String, reason: String },

    #[error("variable not found: {id}")]
    VariableNotFound { id: String },

    #[error("element not found: {id}")]
    ElementNotFound { id: String },

    #[error("event not found: {id}")]
    EventNotFound { id: String },

    #[error("state not found: {id}")]
    StateNotFound { id: String },

    #[error("{field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn required(field: &str) -> Self {
        CoreError::Validation {
            field: field.to_string(),
            reason: "must not be empty".to_string(),
        }
    }

    /// Returns whether this error is a soft "missing reference" error.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::VariableNotFound { .. }
                | CoreError::ElementNotFound { .. }
                | CoreError::EventNotFound { .. }
                | CoreError::StateNotFound { .. }
        )
    }

    /// Returns a stable error code for display and scripting.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::InvalidCondition { .. } => "INVALID_CONDITION",
            CoreError::VariableNotFound { .. } => "VARIABLE_NOT_FOUND",
            CoreError::ElementNotFound { .. } => "ELEMENT_NOT_FOUND",
            CoreError::EventNotFound { .. } => "EVENT_NOT_FOUND",
            CoreError::StateNotFound { .. } => "STATE_NOT_FOUND",
            CoreError::Validation { .. } => "VALIDATION",
            CoreError::DuplicateId { .. } => "DUPLICATE_ID",
            CoreError::Json(_) => "BAD_REQUEST",
        }
    }
}
