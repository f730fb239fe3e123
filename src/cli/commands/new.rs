//! New command implementation.

use super::{Workspace, print_json};
use crate::cli::{NewArgs, to_set};
use crate::edit::{NewIssue, new_issue};
use crate::error::Result;
use crate::format::format_issue_detail;
use serde_json::json;

/// Execute the new command.
///
/// # Errors
///
/// Returns validation errors for the project, issue type, priority or epic
/// fields, or the persist error.
pub fn execute(ws: &mut Workspace, args: NewArgs, json: bool) -> Result<()> {
    let new = NewIssue {
        project: args.project,
        issuetype: args.issuetype,
        summary: args.summary,
        description: args.description,
        assignee: args.assignee,
        reporter: args.reporter,
        priority: args.priority,
        labels: to_set(args.labels),
        fix_versions: to_set(args.fix_versions),
        epic_ref: args.epic_ref,
        epic_name: args.epic_name,
        estimate: args.estimate,
    };
    let issue = new_issue(&mut ws.store, &ws.projects, new)?;

    if json {
        return print_json(&json!({"key": issue.key, "project": issue.project}));
    }
    print!("{}", format_issue_detail(&issue));
    Ok(())
}
