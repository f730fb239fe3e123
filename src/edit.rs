//! Local issue creation and editing.
//!
//! Both operations only touch the working copy and persist the store; the
//! changes reach the remote on the next push.

use crate::error::{JiraError, Result};
use crate::model::{EPIC, Issue, ProjectRegistry};
use crate::store::Store;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Values for an issue created offline.
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub project: String,
    pub issuetype: String,
    pub summary: String,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub priority: Option<String>,
    pub labels: BTreeSet<String>,
    pub fix_versions: BTreeSet<String>,
    pub epic_ref: Option<String>,
    pub epic_name: Option<String>,
    pub estimate: Option<Decimal>,
}

/// Field changes for an existing issue. `None` leaves a field alone; an
/// empty string clears an optional text field.
#[derive(Debug, Clone, Default)]
pub struct IssueChanges {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub priority: Option<String>,
    pub labels: Option<BTreeSet<String>>,
    pub fix_versions: Option<BTreeSet<String>>,
    pub epic_ref: Option<String>,
    pub epic_name: Option<String>,
    pub estimate: Option<Decimal>,
}

impl IssueChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.description.is_none()
            && self.assignee.is_none()
            && self.reporter.is_none()
            && self.priority.is_none()
            && self.labels.is_none()
            && self.fix_versions.is_none()
            && self.epic_ref.is_none()
            && self.epic_name.is_none()
            && self.estimate.is_none()
    }
}

/// Create an issue under a placeholder key and persist the store.
///
/// # Errors
///
/// - `ProjectNotConfigured` for a project never cloned
/// - `Validation` for an unknown issue type or priority, a missing summary,
///   or epic fields that do not fit the issue type
pub fn new_issue(store: &mut Store, projects: &ProjectRegistry, new: NewIssue) -> Result<Issue> {
    if new.project.contains(',') {
        return Err(JiraError::validation("project", "pass a single project key"));
    }
    let project = projects.require(&new.project)?;

    let issuetype = project.issuetype(&new.issuetype).ok_or_else(|| {
        JiraError::validation(
            "issuetype",
            format!("{} is not an issue type of project {}", new.issuetype, project.key),
        )
    })?;
    if let Some(priority) = new.priority.as_deref() {
        if !issuetype.priorities.contains(priority) {
            return Err(JiraError::validation(
                "priority",
                format!("{priority} is not allowed for {}", issuetype.name),
            ));
        }
    }
    if new.summary.trim().is_empty() {
        return Err(JiraError::validation("summary", "cannot be empty"));
    }

    let mut epic_name = new.epic_name;
    if new.issuetype == EPIC {
        if new.epic_ref.is_some() {
            return Err(JiraError::validation("epic_ref", "an Epic cannot belong to an epic"));
        }
        if epic_name.as_deref().is_none_or(|name| name.trim().is_empty()) {
            return Err(JiraError::validation("epic_name", "required when creating an Epic"));
        }
    } else if epic_name.take().is_some() {
        warn!(issuetype = %new.issuetype, "Ignoring epic name for a non-epic issue");
    }

    let mut issue = Issue::new_placeholder(&new.project, &new.issuetype, &new.summary);
    issue.description = new.description;
    issue.assignee = new.assignee;
    issue.reporter = new.reporter;
    issue.priority = new.priority;
    issue.labels = new.labels;
    issue.fix_versions = new.fix_versions;
    issue.epic_ref = new.epic_ref;
    issue.epic_name = epic_name;
    issue.estimate = new.estimate;

    store.insert(issue.clone())?;
    store.persist()?;
    info!(key = %issue.key, project = %issue.project, "Created local issue");
    Ok(issue)
}

/// Apply `changes` to the working copy of `key` and persist the store.
///
/// # Errors
///
/// Returns `IssueNotFound` for an unknown key and `Validation` for an empty
/// summary or epic fields that do not fit the issue type.
pub fn edit_issue(store: &mut Store, key: &str, changes: IssueChanges) -> Result<Issue> {
    let is_epic = store.require(key)?.is_epic();

    if changes.summary.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(JiraError::validation("summary", "cannot be empty"));
    }
    if is_epic && changes.epic_ref.as_deref().is_some_and(|r| !r.is_empty()) {
        return Err(JiraError::validation("epic_ref", "an Epic cannot belong to an epic"));
    }
    if !is_epic && changes.epic_name.as_deref().is_some_and(|n| !n.is_empty()) {
        return Err(JiraError::validation("epic_name", "only Epics have an epic name"));
    }

    let Some(issue) = store.get_mut(key) else {
        return Err(JiraError::IssueNotFound {
            key: key.to_string(),
        });
    };
    if let Some(summary) = changes.summary {
        issue.summary = summary;
    }
    apply_text(&mut issue.description, changes.description);
    apply_text(&mut issue.assignee, changes.assignee);
    apply_text(&mut issue.reporter, changes.reporter);
    apply_text(&mut issue.priority, changes.priority);
    apply_text(&mut issue.epic_ref, changes.epic_ref);
    apply_text(&mut issue.epic_name, changes.epic_name);
    if let Some(labels) = changes.labels {
        issue.labels = labels;
    }
    if let Some(versions) = changes.fix_versions {
        issue.fix_versions = versions;
    }
    if changes.estimate.is_some() {
        issue.estimate = changes.estimate;
    }
    let edited = issue.clone();

    store.persist()?;
    info!(key, modified = ?edited.modified_fields(), "Edited issue");
    Ok(edited)
}

fn apply_text(slot: &mut Option<String>, change: Option<String>) {
    match change {
        Some(value) if value.is_empty() => *slot = None,
        Some(value) => *slot = Some(value),
        None => {}
    }
}
