//! Lint command implementation.

use super::{Workspace, print_json};
use crate::cli::{LintArgs, LintCommand};
use crate::error::Result;
use crate::format::{issue_table, terminal_width};
use crate::lint;
use crate::store::ProjectionRow;
use chrono::Utc;
use serde::Serialize;
use std::io::{self, IsTerminal};
use tracing::warn;

#[derive(Serialize)]
struct LintOutput<'a> {
    rule: &'static str,
    fixed: usize,
    remaining: &'a [ProjectionRow],
}

/// Execute the lint command.
///
/// # Errors
///
/// Returns `Validation` when `--fix` is passed without a value.
pub fn execute(ws: &mut Workspace, args: &LintArgs, json: bool) -> Result<()> {
    let (rule, value, before, after) = match &args.command {
        LintCommand::FixVersions { value } => {
            let before = lint::fix_versions(&mut ws.store, false, None)?.len();
            let after = run(args.fix, value.as_deref(), |fix, v| {
                lint::fix_versions(&mut ws.store, fix, v)
            })?;
            ("fix-versions", value, before, after)
        }
        LintCommand::IssuesMissingEpic { epic_ref } => {
            let before = lint::issues_missing_epic(&mut ws.store, false, None)?.len();
            let after = run(args.fix, epic_ref.as_deref(), |fix, v| {
                lint::issues_missing_epic(&mut ws.store, fix, v)
            })?;
            ("issues-missing-epic", epic_ref, before, after)
        }
    };
    let fixed = if args.fix { before.saturating_sub(after.len()) } else { 0 };

    if json {
        return print_json(&LintOutput {
            rule,
            fixed,
            remaining: &after,
        });
    }

    if args.fix {
        println!(
            "Set {} on {fixed} issues",
            value.as_deref().unwrap_or_default()
        );
    }
    println!("There are {} issues failing {rule}", after.len());
    if !after.is_empty() {
        let rows: Vec<&ProjectionRow> = after.iter().collect();
        let tty = io::stdout().is_terminal();
        print!(
            "{}",
            issue_table(&rows, false, Utc::now()).render(Some(terminal_width()), tty)
        );
    }
    Ok(())
}

fn run(
    fix: bool,
    value: Option<&str>,
    mut lint: impl FnMut(bool, Option<&str>) -> Result<Vec<ProjectionRow>>,
) -> Result<Vec<ProjectionRow>> {
    if !fix && value.is_some() {
        warn!("A fix value has no effect without --fix");
    }
    lint(fix, value)
}
