//! Input validation for tool arguments.
//!
//! Errors name the offending field and, where it helps, how to fix it, so the
//! assistant can correct the call without a round trip to Google.

use std::fmt;

use serde_json::Value;

/// Trait for validating parsed tool arguments.
pub trait Validator {
    fn validate(&self) -> Result<(), String>;
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// Human-readable error message
    pub message: String,
    /// Suggestion for how to fix the error
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} must not be empty", label))
            .with_suggestion(format!("Provide a valid {}", label.to_lowercase()))
    }

    pub fn not_positive(field: &str, value: i64) -> Self {
        Self::new(field, format!("must be at least 1 (got {})", value))
    }

    pub fn non_scalar_cell(field: &str, row: usize, column: usize) -> Self {
        Self::new(
            field,
            format!("cell at row {}, column {} is not a scalar", row, column),
        )
        .with_suggestion("Cells must be strings, numbers, booleans or null")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Formatted message suitable for a tool error result.
    pub fn to_mcp_message(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }

        let mut parts = vec![format!(
            "Validation failed: {} problem(s) found",
            self.errors.len()
        )];
        for (i, error) in self.errors.iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, error));
        }
        parts.join("\n")
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.to_mcp_message())
        }
    }
}

pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    }
}

pub fn validate_positive(value: i64, field: &str, errors: &mut ValidationErrors) {
    if value < 1 {
        errors.add(ValidationError::not_positive(field, value));
    }
}

/// Every cell must be a scalar; row lengths may differ.
pub fn validate_grid(values: &[Vec<Value>], field: &str, errors: &mut ValidationErrors) {
    for (r, row) in values.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if cell.is_array() || cell.is_object() {
                errors.add(ValidationError::non_scalar_cell(field, r + 1, c + 1));
            }
        }
    }
}
