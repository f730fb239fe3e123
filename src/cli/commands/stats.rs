//! Stats command implementation.
//!
//! Counts projection rows grouped by issue type, status or fix version.
//! Without a subcommand all three groupings are printed.

use super::{Workspace, print_json};
use crate::cli::StatsCommand;
use crate::error::Result;
use crate::format::counts_table;
use crate::store::Column;
use std::collections::BTreeMap;
use std::io::{self, IsTerminal};

const ALL: [StatsCommand; 3] = [
    StatsCommand::Issuetype,
    StatsCommand::Status,
    StatsCommand::FixVersions,
];

const fn column(command: StatsCommand) -> (Column, &'static str) {
    match command {
        StatsCommand::Issuetype => (Column::IssueType, "issuetype"),
        StatsCommand::Status => (Column::Status, "status"),
        StatsCommand::FixVersions => (Column::FixVersions, "fix_versions"),
    }
}

/// Execute the stats command.
///
/// # Errors
///
/// Returns an error if JSON output fails to serialize.
pub fn execute(
    ws: &Workspace,
    command: Option<StatsCommand>,
    project: Option<&str>,
    json: bool,
) -> Result<()> {
    let selected = command.map_or_else(|| ALL.to_vec(), |c| vec![c]);
    let projection = ws.store.projection();

    let mut groups = BTreeMap::new();
    for command in selected {
        let (col, label) = column(command);
        groups.insert(label, projection.count_by(col, project));
    }

    if json {
        return print_json(&groups);
    }
    let tty = io::stdout().is_terminal();
    let mut first = true;
    for (label, counts) in &groups {
        if !first {
            println!();
        }
        first = false;
        print!("{}", counts_table(label, counts).render(None, tty));
    }
    Ok(())
}
