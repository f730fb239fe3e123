//! Command implementations.
//!
//! Every command loads the configuration, the project registry and the
//! issue cache, works on the store, and persists only when it changed
//! something.

pub mod edit;
pub mod lint;
pub mod ls;
pub mod new;
pub mod projects;
pub mod show;
pub mod stats;

use crate::config::{self, AppConfig, CliOverrides};
use crate::error::{JiraError, Result};
use crate::model::ProjectRegistry;
use crate::store::Store;
use crate::util::is_placeholder_key;
use tracing::debug;

/// Loaded state shared by the commands.
#[derive(Debug)]
pub struct Workspace {
    pub config: AppConfig,
    pub projects: ProjectRegistry,
    pub store: Store,
}

/// Resolve configuration and load the registry and cache.
///
/// # Errors
///
/// Returns configuration, registry or cache errors.
pub fn open_workspace(cli: &CliOverrides) -> Result<Workspace> {
    let config = config::load_config(cli)?;
    let projects = ProjectRegistry::load(&config.projects_path)?;
    let store = Store::open(&config, &projects)?;
    debug!(
        cache = %config.cache_path.display(),
        projects = projects.len(),
        issues = store.len(),
        "Opened workspace"
    );
    Ok(Workspace {
        config,
        projects,
        store,
    })
}

/// Full key for `input`: an exact key, or an unambiguous prefix of a
/// placeholder key.
///
/// # Errors
///
/// Returns `IssueNotFound` when nothing or more than one issue matches.
pub fn resolve_key(store: &Store, input: &str) -> Result<String> {
    if store.contains_key(input) {
        return Ok(input.to_string());
    }
    let mut matches = store
        .keys()
        .filter(|key| is_placeholder_key(key) && key.starts_with(input));
    match (matches.next(), matches.next()) {
        (Some(key), None) if !input.is_empty() => Ok(key.to_string()),
        _ => Err(JiraError::IssueNotFound {
            key: input.to_string(),
        }),
    }
}

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Issue;

    #[test]
    fn test_resolve_key_accepts_short_placeholder() {
        let mut store = Store::new("unused.jsonl");
        let issue = Issue::new_placeholder("TEST", "Story", "summary");
        let key = issue.key.clone();
        store.insert(issue).unwrap();

        assert_eq!(resolve_key(&store, &key).unwrap(), key);
        assert_eq!(resolve_key(&store, &key[..8]).unwrap(), key);
        assert!(matches!(
            resolve_key(&store, "TEST-1"),
            Err(JiraError::IssueNotFound { .. })
        ));
        assert!(resolve_key(&store, "").is_err());
    }
}
