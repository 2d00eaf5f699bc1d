//! Error types for recruit forms

use thiserror::Error;

use crate::domain::validation::FieldErrors;
use crate::ports::outbound::ApiError;

/// Recruit forms error type
#[derive(Error, Debug)]
pub enum FormsError {
    /// Schema failed structural checks
    #[error("invalid schema: {0}")]
    Schema(String),

    /// Field path could not be parsed
    #[error("invalid field path: {0}")]
    InvalidPath(String),

    /// No field at this path
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Mutation does not fit the field's type
    #[error("field {path} is of type {kind}")]
    KindMismatch { path: String, kind: &'static str },

    /// Field is read-only in the current state
    #[error("field {0} is disabled")]
    FieldDisabled(String),

    /// Array row index out of range
    #[error("row {index} out of range for {array}")]
    RowOutOfRange { array: String, index: usize },

    /// Invalid date input
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Field-level validation failed on submit
    #[error("form has {} invalid field(s)", .0.len())]
    Validation(FieldErrors),

    /// A previous submission has not resolved yet
    #[error("a submission is already in progress")]
    SubmissionInProgress,

    /// Submit attempted without a job post
    #[error("no job post selected")]
    NoJobPostSelected,

    /// No schema has been loaded for the page
    #[error("no form schema loaded")]
    NoSchema,

    /// Backend call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for recruit forms
pub type Result<T> = std::result::Result<T, FormsError>;
