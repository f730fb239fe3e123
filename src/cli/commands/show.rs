//! Show command implementation.

use super::{Workspace, print_json, resolve_key};
use crate::error::Result;
use crate::format::format_issue_detail;
use serde_json::Value as Json;

/// Execute the show command.
///
/// JSON output is the cache record plus the names of modified fields.
///
/// # Errors
///
/// Returns `IssueNotFound` for an unknown key.
pub fn execute(ws: &Workspace, key: &str, json: bool) -> Result<()> {
    let key = resolve_key(&ws.store, key)?;
    let issue = ws.store.require(&key)?;

    if json {
        let mut record = issue.serialize()?;
        record.insert(
            "modified".to_string(),
            Json::from(issue.modified_fields().into_iter().collect::<Vec<_>>()),
        );
        return print_json(&record);
    }

    print!("{}", format_issue_detail(issue));
    Ok(())
}
