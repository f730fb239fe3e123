//! Error types and handling for `jira_offline`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - `DeserializeError` carries the full field path of a failed conversion
//! - Remote provider failures are translated into specific kinds before
//!   falling back to `RemoteApi`
//! - Provides recovery hints for user-facing errors

mod structured;

pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Failure converting between a JSON-compatible value and a typed record.
///
/// The `path` is extended at every recursion level, so an error raised deep
/// inside a nested record names the whole chain (`issuetypes.Story.priorities`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeserializeError {
    /// A mandatory field was absent from the input.
    #[error("Missing input data for mandatory field {path}")]
    MissingField { path: String },

    /// A value could not be coerced into its declared kind.
    #[error("Failed deserializing {value} to {expected} in field {path}")]
    InvalidValue {
        path: String,
        expected: &'static str,
        value: String,
    },
}

impl DeserializeError {
    pub(crate) fn invalid(expected: &'static str, value: impl ToString) -> Self {
        Self::InvalidValue {
            path: String::new(),
            expected,
            value: value.to_string(),
        }
    }

    pub(crate) fn missing(field: &str) -> Self {
        Self::MissingField {
            path: field.to_string(),
        }
    }

    /// Prefix the error path with the enclosing field name.
    #[must_use]
    pub fn in_field(self, field: &str) -> Self {
        let join = |path: String| {
            if path.is_empty() {
                field.to_string()
            } else {
                format!("{field}.{path}")
            }
        };
        match self {
            Self::MissingField { path } => Self::MissingField { path: join(path) },
            Self::InvalidValue {
                path,
                expected,
                value,
            } => Self::InvalidValue {
                path: join(path),
                expected,
                value,
            },
        }
    }

    /// Full field path of the failure.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::MissingField { path } | Self::InvalidValue { path, .. } => path,
        }
    }
}

/// Primary error type for `jira_offline` operations.
#[derive(Error, Debug)]
pub enum JiraError {
    // === Serialization Errors ===
    /// A record failed to convert through the serialization framework.
    #[error("Deserialize error: {0}")]
    Deserialize(#[from] DeserializeError),

    // === Store Errors ===
    /// The issue cache could not be read; nothing was loaded.
    #[error("Cannot read issues cache at line {line}: {reason}")]
    CacheCorrupt { line: usize, reason: String },

    /// Issue with the specified key was not found.
    #[error("Unknown issue key: {key}")]
    IssueNotFound { key: String },

    /// Attempted to insert an issue with a key that already exists.
    #[error("Issue key already exists: {key}")]
    DuplicateKey { key: String },

    // === Project Errors ===
    /// The project does not exist on the remote tracker or in the local registry.
    #[error("Project {project} does not exist")]
    ProjectDoesntExist { project: String },

    /// The project has not been cloned into the local registry.
    #[error("Project {project} is not configured")]
    ProjectNotConfigured { project: String },

    // === Sync Errors ===
    /// A new issue lacks fields the remote requires on create.
    #[error("New issue {key} is missing mandatory fields: {}", missing.join(", "))]
    MissingFieldsForNewIssue { key: String, missing: Vec<String> },

    /// The referenced epic does not exist on the remote.
    #[error("Epic not found: {message}")]
    EpicNotFound { message: String },

    /// The project has no estimate (story points) field available.
    #[error("Estimate field is unavailable on project {project} ({server})")]
    EstimateFieldUnavailable { project: String, server: String },

    /// A field is not configured on the remote screen for this project.
    #[error("Field is not configured on project {project}: {message}")]
    FieldNotConfigured { project: String, message: String },

    /// Local and remote both changed the same fields since the last sync.
    #[error("Conflict on {key}: remote changed {}", fields.join(", "))]
    Conflict { key: String, fields: Vec<String> },

    /// Transport failures and unmatched provider errors.
    #[error("Remote API error: {message}")]
    RemoteApi { message: String },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Config file could not be parsed.
    #[error("Invalid config file '{path}': {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JiraError {
    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ProjectNotConfigured { .. } => Some("Clone the project before using it"),
            Self::Conflict { .. } => {
                Some("Pull again, reconcile the listed fields with `jira edit`, then push")
            }
            Self::CacheCorrupt { .. } => {
                Some("The cache was not loaded; fix or remove the named line, then pull again")
            }
            Self::MissingFieldsForNewIssue { .. } => {
                Some("Set the missing fields with `jira edit` and push again")
            }
            Self::EpicNotFound { .. } => Some("Check the epic key with `jira show`"),
            Self::EstimateFieldUnavailable { .. } | Self::FieldNotConfigured { .. } => {
                Some("Ask a Jira administrator to add the field to the project screens")
            }
            _ => None,
        }
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type using `JiraError`.
pub type Result<T> = std::result::Result<T, JiraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_error_path_nesting() {
        let err = DeserializeError::invalid("Decimal", "abc")
            .in_field("estimate")
            .in_field("parent");
        assert_eq!(err.path(), "parent.estimate");
        assert_eq!(
            err.to_string(),
            "Failed deserializing abc to Decimal in field parent.estimate"
        );
    }

    #[test]
    fn test_missing_field_display() {
        let err = DeserializeError::missing("summary");
        assert_eq!(
            err.to_string(),
            "Missing input data for mandatory field summary"
        );
    }

    #[test]
    fn test_conflict_display() {
        let err = JiraError::Conflict {
            key: "TEST-71".to_string(),
            fields: vec!["assignee".to_string(), "summary".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Conflict on TEST-71: remote changed assignee, summary"
        );
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_validation_error() {
        let err = JiraError::validation("value", "required with --fix");
        assert_eq!(
            err.to_string(),
            "Validation failed: value: required with --fix"
        );
    }
}
