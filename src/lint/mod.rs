//! Bulk rule checks over the store's projection.
//!
//! Each linter selects the issues violating one rule and, with `fix`, writes
//! a caller-supplied value to every violator and persists the store. The
//! return value is always the set still violating after the run.

use crate::error::{JiraError, Result};
use crate::store::{ProjectionRow, Store};
use tracing::info;

/// Issues with no fix version.
///
/// # Errors
///
/// Returns `Validation` when `fix` is set without a value, or the persist
/// error when writing the fixed store fails.
pub fn fix_versions(store: &mut Store, fix: bool, value: Option<&str>) -> Result<Vec<ProjectionRow>> {
    run(
        store,
        "fix_versions",
        fix,
        value,
        |row| row.fix_versions.is_empty(),
        |store, key, value| {
            if let Some(issue) = store.get_mut(key) {
                issue.fix_versions.insert(value.to_string());
            }
        },
    )
}

/// Non-epic issues not linked to an epic.
///
/// # Errors
///
/// Returns `Validation` when `fix` is set without an epic key, or the
/// persist error when writing the fixed store fails.
pub fn issues_missing_epic(
    store: &mut Store,
    fix: bool,
    epic_ref: Option<&str>,
) -> Result<Vec<ProjectionRow>> {
    run(
        store,
        "epic_ref",
        fix,
        epic_ref,
        |row| row.issuetype != crate::model::EPIC && row.epic_ref.is_none(),
        |store, key, value| {
            if let Some(issue) = store.get_mut(key) {
                issue.epic_ref = Some(value.to_string());
            }
        },
    )
}

fn run(
    store: &mut Store,
    field: &str,
    fix: bool,
    value: Option<&str>,
    violates: impl Fn(&ProjectionRow) -> bool,
    apply: impl Fn(&mut Store, &str, &str),
) -> Result<Vec<ProjectionRow>> {
    let value = match (fix, value.map(str::trim)) {
        (false, _) => None,
        (true, Some(v)) if !v.is_empty() => Some(v),
        (true, _) => {
            return Err(JiraError::validation(field, "a value is required with --fix"));
        }
    };

    let violating = collect(store, &violates);
    let Some(value) = value else {
        return Ok(violating);
    };
    if violating.is_empty() {
        return Ok(violating);
    }

    for row in &violating {
        apply(store, &row.key, value);
    }
    store.persist()?;
    info!(field, fixed = violating.len(), value, "Applied lint fix");

    Ok(collect(store, &violates))
}

fn collect(store: &Store, violates: &impl Fn(&ProjectionRow) -> bool) -> Vec<ProjectionRow> {
    store
        .projection()
        .rows()
        .iter()
        .filter(|row| violates(row))
        .cloned()
        .collect()
}
