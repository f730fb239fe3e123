//! Local issue store backed by a line-delimited JSON cache.
//!
//! - Issues are keyed by issue key and iterate in insertion order
//! - `load` is all-or-nothing: a corrupt cache leaves the store empty
//! - `persist` rewrites the whole cache through a temp file and rename
//! - The projection is built lazily and dropped on every mutation
//!
//! There is no cross-process lock on the cache file. Two processes that
//! load, mutate and persist the same file race, and the last writer wins.

pub mod projection;

pub use projection::{Column, NO_VALUE, Projection, ProjectionRow};

use crate::config::{AppConfig, DEFAULT_CLOSED_STATUSES, DEFAULT_EXCLUDED_ISSUETYPES};
use crate::error::{JiraError, Result};
use crate::model::{Issue, ProjectRegistry};
use once_cell::unsync::OnceCell;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Keyed, ordered collection of issues.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    issues: HashMap<String, Issue>,
    order: Vec<String>,
    excluded_issuetypes: Vec<String>,
    closed_statuses: Vec<String>,
    projection: OnceCell<Projection>,
}

impl Store {
    /// An empty store bound to `path`, using default report settings.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            issues: HashMap::new(),
            order: Vec::new(),
            excluded_issuetypes: DEFAULT_EXCLUDED_ISSUETYPES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            closed_statuses: DEFAULT_CLOSED_STATUSES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            projection: OnceCell::new(),
        }
    }

    /// An empty store configured from application settings.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let mut store = Self::new(&config.cache_path);
        store.excluded_issuetypes.clone_from(&config.excluded_issuetypes);
        store.closed_statuses.clone_from(&config.closed_statuses);
        store
    }

    /// Open a store and load its cache.
    pub fn open(config: &AppConfig, projects: &ProjectRegistry) -> Result<Self> {
        let mut store = Self::from_config(config);
        store.load(projects)?;
        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn closed_statuses(&self) -> &[String] {
        &self.closed_statuses
    }

    /// Replace the contents with the cache file.
    ///
    /// A missing or empty file is an empty store. Any unreadable record
    /// aborts the load and leaves the store empty.
    ///
    /// # Errors
    ///
    /// Returns `CacheCorrupt` naming the first bad line.
    pub fn load(&mut self, projects: &ProjectRegistry) -> Result<()> {
        self.clear();

        if !self.path.exists() {
            debug!(path = %self.path.display(), "No issue cache yet");
            return Ok(());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut issues = HashMap::new();
        let mut order = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line_no = line_num + 1;
            let line = line.map_err(|e| corrupt(line_no, &e))?;
            if line.trim().is_empty() {
                continue;
            }
            let raw: Json = serde_json::from_str(&line).map_err(|e| corrupt(line_no, &e))?;
            let issue = Issue::from_cache(&raw, projects).map_err(|e| corrupt(line_no, &e))?;
            if issues.contains_key(&issue.key) {
                return Err(corrupt(line_no, &format!("duplicate key {}", issue.key)));
            }
            order.push(issue.key.clone());
            issues.insert(issue.key.clone(), issue);
        }

        self.issues = issues;
        self.order = order;
        info!(path = %self.path.display(), count = self.order.len(), "Loaded issue cache");
        Ok(())
    }

    /// Write every issue to the cache file, replacing it.
    pub fn persist(&self) -> Result<()> {
        let mut contents = String::new();
        for issue in self.iter() {
            let record = issue.serialize()?;
            contents.push_str(&serde_json::to_string(&record)?);
            contents.push('\n');
        }
        crate::util::write_atomic(&self.path, contents.as_bytes())?;
        debug!(path = %self.path.display(), count = self.order.len(), "Persisted issue cache");
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Issue> {
        self.issues.get(key)
    }

    /// Look up an issue, failing when absent.
    pub fn require(&self, key: &str) -> Result<&Issue> {
        self.get(key).ok_or_else(|| JiraError::IssueNotFound {
            key: key.to_string(),
        })
    }

    /// Mutable access; drops the projection.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Issue> {
        self.projection.take();
        self.issues.get_mut(key)
    }

    /// Add a new issue.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` when the key is already present.
    pub fn insert(&mut self, issue: Issue) -> Result<()> {
        if self.issues.contains_key(&issue.key) {
            return Err(JiraError::DuplicateKey { key: issue.key });
        }
        self.set(issue);
        Ok(())
    }

    /// Insert or replace an issue, keeping its position when replaced.
    pub fn set(&mut self, issue: Issue) {
        self.projection.take();
        if !self.issues.contains_key(&issue.key) {
            self.order.push(issue.key.clone());
        }
        self.issues.insert(issue.key.clone(), issue);
    }

    pub fn remove(&mut self, key: &str) -> Option<Issue> {
        let issue = self.issues.remove(key)?;
        self.projection.take();
        self.order.retain(|k| k != key);
        Some(issue)
    }

    /// Re-key an issue in place, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` for an unknown `from`, `DuplicateKey` when
    /// `to` is taken.
    pub fn rename_key(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Ok(());
        }
        if self.issues.contains_key(to) {
            return Err(JiraError::DuplicateKey {
                key: to.to_string(),
            });
        }
        let mut issue = self.issues.remove(from).ok_or_else(|| JiraError::IssueNotFound {
            key: from.to_string(),
        })?;
        self.projection.take();
        issue.key = to.to_string();
        self.issues.insert(to.to_string(), issue);
        if let Some(slot) = self.order.iter_mut().find(|k| *k == from) {
            *slot = to.to_string();
        }
        Ok(())
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Issues in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.order.iter().filter_map(|key| self.issues.get(key))
    }

    /// Keys of issues with unpushed local changes, in insertion order.
    #[must_use]
    pub fn modified_keys(&self) -> Vec<String> {
        self.iter()
            .filter(|issue| issue.has_local_changes())
            .map(|issue| issue.key.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.issues.contains_key(key)
    }

    /// Remove every issue from memory; the cache file is untouched.
    pub fn clear(&mut self) {
        self.projection.take();
        self.issues.clear();
        self.order.clear();
    }

    /// The reporting projection, built on first use after a mutation.
    pub fn projection(&self) -> &Projection {
        self.projection.get_or_init(|| {
            debug!(count = self.order.len(), "Building projection");
            Projection::build(self.iter(), &self.excluded_issuetypes, &self.closed_statuses)
        })
    }
}

fn corrupt(line: usize, reason: &impl std::fmt::Display) -> JiraError {
    JiraError::CacheCorrupt {
        line,
        reason: reason.to_string(),
    }
}
