//! Edit command implementation.

use super::{Workspace, resolve_key};
use crate::cli::{EditArgs, to_set};
use crate::edit::{IssueChanges, edit_issue};
use crate::error::{JiraError, Result};
use crate::format::format_issue_detail;

/// Execute the edit command.
///
/// # Errors
///
/// Returns `IssueNotFound` for an unknown key and `Validation` when no
/// change was given or a change does not fit the issue.
pub fn execute(ws: &mut Workspace, args: EditArgs, json: bool) -> Result<()> {
    let key = resolve_key(&ws.store, &args.key)?;
    let changes = IssueChanges {
        summary: args.summary,
        description: args.description,
        assignee: args.assignee,
        reporter: args.reporter,
        priority: args.priority,
        labels: args.labels.map(to_set),
        fix_versions: args.fix_versions.map(to_set),
        epic_ref: args.epic_ref,
        epic_name: args.epic_name,
        estimate: args.estimate,
    };
    if changes.is_empty() {
        return Err(JiraError::validation("edit", "no changes given"));
    }

    let issue = edit_issue(&mut ws.store, &key, changes)?;
    if json {
        return super::print_json(&issue.serialize()?);
    }
    print!("{}", format_issue_detail(&issue));
    Ok(())
}
