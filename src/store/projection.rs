//! Tabular reporting view over the store.

use crate::model::Issue;
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Label used for issues with no value in a grouped column.
pub const NO_VALUE: &str = "(none)";

/// One issue as seen by reports and linters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionRow {
    pub key: String,
    pub project: String,
    pub issuetype: String,
    pub summary: String,
    pub status: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<String>,
    pub labels: BTreeSet<String>,
    pub fix_versions: BTreeSet<String>,
    pub epic_ref: Option<String>,
    pub epic_name: Option<String>,
    pub estimate: Option<Decimal>,
    pub updated: Option<DateTime<FixedOffset>>,
    pub is_open: bool,
    pub is_new: bool,
    pub is_modified: bool,
}

impl ProjectionRow {
    fn from_issue(issue: &Issue, closed_statuses: &[String]) -> Self {
        Self {
            key: issue.key.clone(),
            project: issue.project.clone(),
            issuetype: issue.issuetype.clone(),
            summary: issue.summary.clone(),
            status: issue.status.clone(),
            assignee: issue.assignee.clone(),
            priority: issue.priority.clone(),
            labels: issue.labels.clone(),
            fix_versions: issue.fix_versions.clone(),
            epic_ref: issue.epic_ref.clone(),
            epic_name: issue.epic_name.clone(),
            estimate: issue.estimate,
            updated: issue.updated,
            is_open: issue.is_open(closed_statuses),
            is_new: issue.is_new(),
            is_modified: issue.has_local_changes(),
        }
    }
}

/// Column used to group rows in [`Projection::count_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    IssueType,
    Status,
    FixVersions,
}

/// Rows for every issue except the excluded issue types, in store order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    rows: Vec<ProjectionRow>,
}

impl Projection {
    #[must_use]
    pub fn build<'a>(
        issues: impl IntoIterator<Item = &'a Issue>,
        excluded_issuetypes: &[String],
        closed_statuses: &[String],
    ) -> Self {
        let rows = issues
            .into_iter()
            .filter(|issue| !excluded_issuetypes.contains(&issue.issuetype))
            .map(|issue| ProjectionRow::from_issue(issue, closed_statuses))
            .collect();
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[ProjectionRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ProjectionRow> {
        self.rows.iter().find(|row| row.key == key)
    }

    /// Rows belonging to `project`; every row when `project` is `None`.
    #[must_use]
    pub fn filter_project(&self, project: Option<&str>) -> Vec<&ProjectionRow> {
        self.rows
            .iter()
            .filter(|row| project.is_none_or(|p| row.project == p))
            .collect()
    }

    /// Count rows per value of `column`, sorted by value.
    ///
    /// A row with several fix versions counts once for each.
    #[must_use]
    pub fn count_by(&self, column: Column, project: Option<&str>) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for row in self.filter_project(project) {
            let values: Vec<String> = match column {
                Column::IssueType => vec![row.issuetype.clone()],
                Column::Status => vec![row.status.clone().unwrap_or_else(|| NO_VALUE.to_string())],
                Column::FixVersions if row.fix_versions.is_empty() => vec![NO_VALUE.to_string()],
                Column::FixVersions => row.fix_versions.iter().cloned().collect(),
            };
            for value in values {
                *counts.entry(value).or_insert(0) += 1;
            }
        }
        counts
    }
}
