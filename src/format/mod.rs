//! Output formatting for `jira_offline`.
//!
//! - [`issue_table`] - Issue list for `ls` and `lint`
//! - [`counts_table`] - Grouped counts for `stats`
//! - [`format_issue_detail`] - Full field listing for `show`
//!
//! Placeholder keys are shown in their short form everywhere.

mod table;
mod text;

pub use table::Table;
pub use text::{pad, relative_time, terminal_width, truncate, visible_len};

use crate::model::Issue;
use crate::serializer::datetime::format_datetime;
use crate::store::ProjectionRow;
use crate::util::short_key;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

fn join(values: &BTreeSet<String>) -> String {
    values.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

/// Table of projection rows.
///
/// Verbose adds the epic name and fix versions and prints full timestamps
/// instead of relative ones.
#[must_use]
pub fn issue_table(rows: &[&ProjectionRow], verbose: bool, now: DateTime<Utc>) -> Table {
    let mut headers = vec!["key", "issuetype", "epic_ref"];
    if verbose {
        headers.push("epic_name");
    }
    headers.extend(["summary", "assignee"]);
    if verbose {
        headers.push("fix_versions");
    }
    headers.push("updated");
    let summary_col = headers.iter().position(|h| *h == "summary").unwrap_or(0);

    let mut table = Table::new(headers).flex(summary_col);
    for row in rows {
        let updated = row.updated.as_ref().map_or_else(String::new, |dt| {
            if verbose {
                format_datetime(dt)
            } else {
                relative_time(dt, now)
            }
        });
        let mut cells = vec![
            short_key(&row.key).to_string(),
            row.issuetype.clone(),
            row.epic_ref.as_deref().map(short_key).unwrap_or_default().to_string(),
        ];
        if verbose {
            cells.push(row.epic_name.clone().unwrap_or_default());
        }
        cells.push(row.summary.clone());
        cells.push(row.assignee.clone().unwrap_or_default());
        if verbose {
            cells.push(join(&row.fix_versions));
        }
        cells.push(updated);
        table.push_row(cells);
    }
    table
}

/// Two-column table of `counts` under `label`.
#[must_use]
pub fn counts_table(label: &str, counts: &BTreeMap<String, usize>) -> Table {
    let mut table = Table::new([label, "count"]);
    for (value, count) in counts {
        table.push_row(vec![value.clone(), count.to_string()]);
    }
    table
}

/// Every populated field of an issue, one per line, with modified fields
/// flagged by `*`.
#[must_use]
pub fn format_issue_detail(issue: &Issue) -> String {
    let modified = issue.modified_fields();
    let mut fields: Vec<(&str, String)> = vec![
        ("key", issue.key.clone()),
        ("project", issue.project.clone()),
        ("issuetype", issue.issuetype.clone()),
        ("summary", issue.summary.clone()),
    ];
    let optional = [
        ("status", issue.status.clone()),
        ("priority", issue.priority.clone()),
        ("assignee", issue.assignee.clone()),
        ("reporter", issue.reporter.clone()),
        ("creator", issue.creator.clone()),
        ("epic_ref", issue.epic_ref.clone()),
        ("epic_name", issue.epic_name.clone()),
        ("estimate", issue.estimate.map(|d| d.normalize().to_string())),
        ("description", issue.description.clone()),
    ];
    fields.extend(optional.into_iter().filter_map(|(name, value)| value.map(|v| (name, v))));
    if !issue.labels.is_empty() {
        fields.push(("labels", join(&issue.labels)));
    }
    if !issue.fix_versions.is_empty() {
        fields.push(("fix_versions", join(&issue.fix_versions)));
    }
    if let Some(created) = &issue.created {
        fields.push(("created", format_datetime(created)));
    }
    if let Some(updated) = &issue.updated {
        fields.push(("updated", format_datetime(updated)));
    }

    let width = fields.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, value) in fields {
        let marker = if modified.contains(name) { '*' } else { ' ' };
        let _ = writeln!(out, "{marker} {}  {value}", pad(name, width));
    }
    if issue.is_new() {
        out.push_str("\nNot yet pushed\n");
    }
    out
}
