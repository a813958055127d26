//! Request Validation Module
//!
//! Query length checks and input sanitization.

use thiserror::Error;

use crate::error::AppError;

/// Validation error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField { field: String },

    #[error("Field '{field}' is too long (max: {max}, got: {got})")]
    TooLong {
        field: String,
        max: usize,
        got: usize,
    },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field } => field.as_str(),
            Self::TooLong { field, .. } => field.as_str(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Validation result type
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Query validator
#[derive(Debug, Clone)]
pub struct QueryValidator {
    /// Maximum query length in characters
    max_length: usize,
}

impl Default for QueryValidator {
    fn default() -> Self {
        Self::new(2048)
    }
}

impl QueryValidator {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Sanitize and validate a query, returning the text to resolve
    ///
    /// Only non-whitespace control characters are removed. Whitespace, tabs
    /// and newlines included, and case are kept exactly as sent.
    pub fn validate_query(&self, query: &str) -> ValidationResult<String> {
        let sanitized = Self::sanitize_string(query);

        if sanitized.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "query".to_string(),
            });
        }

        let length = sanitized.chars().count();
        if length > self.max_length {
            return Err(ValidationError::TooLong {
                field: "query".to_string(),
                max: self.max_length,
                got: length,
            });
        }

        Ok(sanitized)
    }

    /// Remove null bytes and control characters, keeping whitespace
    pub fn sanitize_string(input: &str) -> String {
        input
            .chars()
            .filter(|c| !c.is_control() || c.is_whitespace())
            .collect()
    }
}
