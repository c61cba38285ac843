//! Crate-wide error types.
//!
//! Validation failures carry the offending field name so callers can report
//! them next to the form field instead of as a generic failure.

use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("{kind} not found: {code}")]
    NotFound { kind: &'static str, code: String },

    #[error("Invalid value for '{field}': {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("No data to export.")]
    NoData,

    #[error("At least one contact is required")]
    LastContact,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to send notification: {0}")]
    Mail(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrmError {
    /// Shortcut for a missing mandatory field.
    pub fn mandatory(field: &'static str) -> Self {
        CrmError::Validation {
            field,
            reason: "this field is mandatory".to_string(),
        }
    }
}
