//! Remote tracker contract and provider error translation.
//!
//! The transport (HTTP, authentication, timeouts) lives behind
//! [`IssueTracker`]; this crate only consumes it. Calls are blocking.

use crate::error::JiraError;
use crate::model::ProjectMeta;
use serde_json::{Map, Value as Json};
use thiserror::Error;

/// A failed call to the remote tracker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}{message}", .status.map(|s| format!("HTTP {s}: ")).unwrap_or_default())]
pub struct RemoteError {
    /// HTTP status, when the failure came from a response.
    pub status: Option<u16>,
    /// Provider error text.
    pub message: String,
}

impl RemoteError {
    #[must_use]
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Key and id assigned by the remote to a created issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub key: String,
    pub id: i64,
}

/// Blocking client for one remote issue tracker.
///
/// Issue payloads use the remote's own shape
/// (`{"id", "key", "fields": {...}}`); field maps passed to `create` and
/// `update` are already translated to remote field ids.
pub trait IssueTracker {
    /// Create-meta schema for a project (issue types, priorities, custom fields).
    fn project_meta(&self, project: &ProjectMeta) -> Result<Json, RemoteError>;

    /// One page of a project's issues; an empty page ends the search.
    fn search(
        &self,
        project: &ProjectMeta,
        start_at: usize,
        max_results: usize,
    ) -> Result<Vec<Json>, RemoteError>;

    /// Current remote state of one issue.
    fn fetch(&self, project: &ProjectMeta, key: &str) -> Result<Json, RemoteError>;

    fn create(
        &self,
        project: &ProjectMeta,
        fields: &Map<String, Json>,
    ) -> Result<CreatedIssue, RemoteError>;

    fn update(
        &self,
        project: &ProjectMeta,
        key: &str,
        fields: &Map<String, Json>,
    ) -> Result<(), RemoteError>;
}

const EPIC_NOT_FOUND: &str = "gh.epic.error.not.found";
const ESTIMATE_UNAVAILABLE: &str = "Field 'estimate' cannot be set";
const FIELD_NOT_ON_SCREEN: &str = "cannot be set. It is not on the appropriate screen, or unknown.";

/// Map a provider error onto a specific error kind.
///
/// Falls back to `RemoteApi` when no known message matches.
#[must_use]
pub fn translate_error(project: &ProjectMeta, context: &str, err: &RemoteError) -> JiraError {
    let detail = format!("{context} with error \"{}\"", err.message);

    if err.message.contains(EPIC_NOT_FOUND) {
        JiraError::EpicNotFound { message: detail }
    } else if err.message.contains(ESTIMATE_UNAVAILABLE) {
        JiraError::EstimateFieldUnavailable {
            project: project.key.clone(),
            server: project.server_label(),
        }
    } else if err.message.contains(FIELD_NOT_ON_SCREEN) {
        JiraError::FieldNotConfigured {
            project: project.key.clone(),
            message: detail,
        }
    } else {
        JiraError::RemoteApi {
            message: format!("{context}: {err}"),
        }
    }
}
