//! Projects command implementation.

use super::{Workspace, print_json};
use crate::error::Result;
use crate::format::Table;
use serde_json::json;
use std::io::{self, IsTerminal};

/// Execute the projects command.
///
/// # Errors
///
/// Returns an error if JSON output fails to serialize.
pub fn execute(ws: &Workspace, json: bool) -> Result<()> {
    if json {
        let projects: Vec<_> = ws
            .projects
            .iter()
            .map(|meta| {
                json!({
                    "key": meta.key,
                    "name": meta.name,
                    "jira_server": meta.jira_server,
                    "issuetypes": meta.issuetypes.keys().collect::<Vec<_>>(),
                })
            })
            .collect();
        return print_json(&projects);
    }

    if ws.projects.is_empty() {
        println!("No projects cloned");
        return Ok(());
    }
    let mut table = Table::new(["key", "name", "server", "issues"]);
    for meta in ws.projects.iter() {
        let issues = ws.store.iter().filter(|i| i.project == meta.key).count();
        table.push_row(vec![
            meta.key.clone(),
            meta.name.clone().unwrap_or_default(),
            meta.server_label(),
            issues.to_string(),
        ]);
    }
    print!("{}", table.render(None, io::stdout().is_terminal()));
    Ok(())
}
