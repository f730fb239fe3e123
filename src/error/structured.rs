//! Structured error output for `--json` and non-interactive callers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging

use crate::error::{DeserializeError, JiraError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// Format: `SCREAMING_SNAKE_CASE` for easy parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Store Errors (exit code 2) ===
    /// Cache file could not be loaded
    CacheCorrupt,
    /// Key already present in the store
    DuplicateKey,

    // === Issue Errors (exit code 3) ===
    /// Issue with specified key not found
    IssueNotFound,

    // === Validation Errors (exit code 4) ===
    /// Field validation failed
    ValidationFailed,
    /// Mandatory field missing on a new issue
    RequiredField,
    /// Record could not be deserialized
    DeserializeFailed,

    // === Project Errors (exit code 5) ===
    /// Project is absent remotely
    ProjectNotFound,
    /// Project is not in the local registry
    ProjectNotConfigured,
    /// Custom field missing on the project
    FieldNotConfigured,

    // === Sync Errors (exit code 6) ===
    /// Local and remote changes collide
    Conflict,
    /// Epic reference not found remotely
    EpicNotFound,
    /// Remote API failure
    RemoteError,

    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CacheCorrupt => "CACHE_CORRUPT",
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::IssueNotFound => "ISSUE_NOT_FOUND",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::RequiredField => "REQUIRED_FIELD",
            Self::DeserializeFailed => "DESERIALIZE_FAILED",
            Self::ProjectNotFound => "PROJECT_NOT_FOUND",
            Self::ProjectNotConfigured => "PROJECT_NOT_CONFIGURED",
            Self::FieldNotConfigured => "FIELD_NOT_CONFIGURED",
            Self::Conflict => "CONFLICT",
            Self::EpicNotFound => "EPIC_NOT_FOUND",
            Self::RemoteError => "REMOTE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is potentially retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed | Self::RequiredField | Self::Conflict | Self::RemoteError
        )
    }

    /// Get the exit code for this error category.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::CacheCorrupt | Self::DuplicateKey => 2,
            Self::IssueNotFound => 3,
            Self::ValidationFailed | Self::RequiredField | Self::DeserializeFailed => 4,
            Self::ProjectNotFound | Self::ProjectNotConfigured | Self::FieldNotConfigured => 5,
            Self::Conflict | Self::EpicNotFound | Self::RemoteError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `JiraError`.
    #[must_use]
    pub fn from_error(err: &JiraError) -> Self {
        let (code, context) = extract_code_and_context(err);
        Self {
            code,
            message: err.to_string(),
            hint: err.suggestion().map(str::to_string),
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Create a structured error with similar key suggestions.
    #[must_use]
    pub fn issue_not_found(searched: &str, existing: &[String]) -> Self {
        let similar = find_similar_keys(searched, existing, 3);

        let hint = match similar.as_slice() {
            [] => "Run 'jira ls' to see available issues.".to_string(),
            [one] => format!("Did you mean '{one}'?"),
            many => format!("Did you mean one of: {}?", many.join(", ")),
        };

        Self {
            code: ErrorCode::IssueNotFound,
            message: format!("Unknown issue key: {searched}"),
            hint: Some(hint),
            retryable: false,
            context: Some(json!({
                "searched_key": searched,
                "similar_keys": similar,
            })),
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }
        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }
}

fn extract_code_and_context(err: &JiraError) -> (ErrorCode, Option<Value>) {
    match err {
        JiraError::Deserialize(inner) => (
            ErrorCode::DeserializeFailed,
            Some(json!({"path": inner.path(), "missing": matches!(inner, DeserializeError::MissingField { .. })})),
        ),
        JiraError::CacheCorrupt { line, .. } => {
            (ErrorCode::CacheCorrupt, Some(json!({"line": line})))
        }
        JiraError::IssueNotFound { key } => (ErrorCode::IssueNotFound, Some(json!({"key": key}))),
        JiraError::DuplicateKey { key } => (ErrorCode::DuplicateKey, Some(json!({"key": key}))),
        JiraError::ProjectDoesntExist { project } => {
            (ErrorCode::ProjectNotFound, Some(json!({"project": project})))
        }
        JiraError::ProjectNotConfigured { project } => (
            ErrorCode::ProjectNotConfigured,
            Some(json!({"project": project})),
        ),
        JiraError::MissingFieldsForNewIssue { key, missing } => (
            ErrorCode::RequiredField,
            Some(json!({"key": key, "missing": missing})),
        ),
        JiraError::EpicNotFound { .. } => (ErrorCode::EpicNotFound, None),
        JiraError::EstimateFieldUnavailable { project, .. }
        | JiraError::FieldNotConfigured { project, .. } => (
            ErrorCode::FieldNotConfigured,
            Some(json!({"project": project})),
        ),
        JiraError::Conflict { key, fields } => (
            ErrorCode::Conflict,
            Some(json!({"key": key, "fields": fields})),
        ),
        JiraError::RemoteApi { .. } => (ErrorCode::RemoteError, None),
        JiraError::Validation { field, .. } => {
            (ErrorCode::ValidationFailed, Some(json!({"field": field})))
        }
        JiraError::Config(_) => (ErrorCode::ConfigError, None),
        JiraError::ConfigFile { path, .. } => (
            ErrorCode::ConfigError,
            Some(json!({"path": path.display().to_string()})),
        ),
        JiraError::Io(_) => (ErrorCode::IoError, None),
        JiraError::Json(_) => (ErrorCode::JsonError, None),
        JiraError::Yaml(_) => (ErrorCode::YamlError, None),
        JiraError::Other(_) => (ErrorCode::InternalError, None),
    }
}

/// Calculate the Levenshtein distance between two strings.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (prev[j + 1] + 1).min(current[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b_chars.len()]
}

/// Find keys similar to the searched key using Levenshtein distance.
///
/// Returns up to `max_suggestions` keys with distance <= 3.
pub fn find_similar_keys(searched: &str, existing: &[String], max_suggestions: usize) -> Vec<String> {
    let mut candidates: Vec<(usize, &str)> = existing
        .iter()
        .map(|key| (levenshtein_distance(searched, key), key.as_str()))
        .filter(|(dist, _)| *dist <= 3)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    candidates
        .into_iter()
        .take(max_suggestions)
        .map(|(_, key)| key.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_exit_codes() {
        assert_eq!(ErrorCode::CacheCorrupt.exit_code(), 2);
        assert_eq!(ErrorCode::IssueNotFound.exit_code(), 3);
        assert_eq!(ErrorCode::ValidationFailed.exit_code(), 4);
        assert_eq!(ErrorCode::ProjectNotConfigured.exit_code(), 5);
        assert_eq!(ErrorCode::Conflict.exit_code(), 6);
        assert_eq!(ErrorCode::ConfigError.exit_code(), 7);
        assert_eq!(ErrorCode::IoError.exit_code(), 8);
        assert_eq!(ErrorCode::InternalError.exit_code(), 1);
    }

    #[test]
    fn test_from_conflict_error() {
        let err = JiraError::Conflict {
            key: "TEST-71".to_string(),
            fields: vec!["assignee".to_string()],
        };
        let structured = StructuredError::from_error(&err);
        let json = structured.to_json();
        assert_eq!(json["error"]["code"], "CONFLICT");
        assert_eq!(json["error"]["context"]["fields"][0], "assignee");
        assert!(json["error"]["retryable"].as_bool().unwrap());
    }

    #[test]
    fn test_deserialize_error_context_carries_path() {
        let err = JiraError::from(DeserializeError::missing("summary").in_field("server_object"));
        let structured = StructuredError::from_error(&err);
        assert_eq!(structured.code, ErrorCode::DeserializeFailed);
        assert_eq!(
            structured.context.unwrap()["path"],
            "server_object.summary"
        );
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", "abd"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_issue_not_found_suggests_close_keys() {
        let existing = vec![
            "TEST-71".to_string(),
            "TEST-72".to_string(),
            "OTHER-1".to_string(),
        ];
        let err = StructuredError::issue_not_found("TEST-7", &existing);
        let hint = err.hint.unwrap();
        assert!(hint.contains("TEST-71"));
        assert!(hint.contains("TEST-72"));
        assert!(!hint.contains("OTHER-1"));
    }

    #[test]
    fn test_to_human_output() {
        let err = StructuredError::from_error(&JiraError::IssueNotFound {
            key: "TEST-1".to_string(),
        });
        assert_eq!(err.to_human(false), "Error: Unknown issue key: TEST-1");
    }
}
