//! Ls command implementation.

use super::{Workspace, print_json};
use crate::cli::{LsArgs, OutputFormat};
use crate::error::Result;
use crate::format::{issue_table, terminal_width};
use crate::store::ProjectionRow;
use chrono::Utc;
use std::io::{self, IsTerminal};

/// Rows selected by the `ls` filters, in store order.
#[must_use]
pub fn select<'a>(ws: &'a Workspace, args: &LsArgs) -> Vec<&'a ProjectionRow> {
    ws.store
        .projection()
        .filter_project(args.project.as_deref())
        .into_iter()
        .filter(|row| args.all || row.is_open)
        .filter(|row| !args.modified || row.is_modified)
        .collect()
}

/// Execute the ls command.
///
/// # Errors
///
/// Returns an error if JSON output fails to serialize.
pub fn execute(ws: &Workspace, args: &LsArgs, format: OutputFormat) -> Result<()> {
    let rows = select(ws, args);

    if format == OutputFormat::Json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No issues in the cache");
        return Ok(());
    }

    let tty = io::stdout().is_terminal();
    let width = (!args.long).then(terminal_width);
    let table = issue_table(&rows, args.long, Utc::now());
    print!("{}", table.render(width, tty));
    Ok(())
}
