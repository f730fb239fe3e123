#![allow(dead_code)]

use jira_offline::model::ProjectMeta;
use jira_offline::sync::{CreatedIssue, IssueTracker, RemoteError};
use serde_json::{Map, Value, json};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// One call made against the fake.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ProjectMeta,
    Search { start_at: usize },
    Fetch { key: String },
    Create { fields: Map<String, Value> },
    Update { key: String, fields: Map<String, Value> },
}

/// In-memory tracker holding issues in the remote shape.
///
/// Every call is recorded. Failures can be injected per key (update, fetch)
/// or per summary (create).
#[derive(Default)]
pub struct FakeTracker {
    pub meta: RefCell<Value>,
    issues: RefCell<Vec<Value>>,
    calls: RefCell<Vec<Call>>,
    fail_update: RefCell<HashMap<String, RemoteError>>,
    fail_fetch: RefCell<HashMap<String, RemoteError>>,
    fail_create: RefCell<HashMap<String, RemoteError>>,
    next_number: Cell<u32>,
}

impl FakeTracker {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.next_number.set(100);
        fake
    }

    pub fn with_issues(issues: impl IntoIterator<Item = Value>) -> Self {
        let fake = Self::new();
        fake.issues.borrow_mut().extend(issues);
        fake
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn updates(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Update { key, fields } => Some((key.clone(), fields.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn creates(&self) -> Vec<Map<String, Value>> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Create { fields } => Some(fields.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn issue(&self, key: &str) -> Option<Value> {
        self.issues
            .borrow()
            .iter()
            .find(|raw| raw["key"] == key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.issues.borrow().len()
    }

    /// Change a remote issue's fields, as another user would.
    pub fn edit_remote(&self, key: &str, edit: impl FnOnce(&mut Map<String, Value>)) {
        let mut issues = self.issues.borrow_mut();
        let raw = issues
            .iter_mut()
            .find(|raw| raw["key"] == key)
            .expect("remote issue exists");
        let fields = raw["fields"].as_object_mut().expect("fields object");
        edit(fields);
    }

    pub fn fail_update(&self, key: &str, message: &str) {
        self.fail_update
            .borrow_mut()
            .insert(key.to_string(), RemoteError::new(Some(400), message));
    }

    pub fn fail_fetch(&self, key: &str, message: &str) {
        self.fail_fetch
            .borrow_mut()
            .insert(key.to_string(), RemoteError::new(Some(404), message));
    }

    pub fn fail_create(&self, summary: &str, message: &str) {
        self.fail_create
            .borrow_mut()
            .insert(summary.to_string(), RemoteError::new(Some(400), message));
    }
}

impl IssueTracker for FakeTracker {
    fn project_meta(&self, _project: &ProjectMeta) -> Result<Value, RemoteError> {
        self.calls.borrow_mut().push(Call::ProjectMeta);
        Ok(self.meta.borrow().clone())
    }

    fn search(
        &self,
        _project: &ProjectMeta,
        start_at: usize,
        max_results: usize,
    ) -> Result<Vec<Value>, RemoteError> {
        self.calls.borrow_mut().push(Call::Search { start_at });
        Ok(self
            .issues
            .borrow()
            .iter()
            .skip(start_at)
            .take(max_results)
            .cloned()
            .collect())
    }

    fn fetch(&self, _project: &ProjectMeta, key: &str) -> Result<Value, RemoteError> {
        self.calls.borrow_mut().push(Call::Fetch {
            key: key.to_string(),
        });
        if let Some(err) = self.fail_fetch.borrow().get(key) {
            return Err(err.clone());
        }
        self.issue(key)
            .ok_or_else(|| RemoteError::new(Some(404), "Issue Does Not Exist"))
    }

    fn create(
        &self,
        project: &ProjectMeta,
        fields: &Map<String, Value>,
    ) -> Result<CreatedIssue, RemoteError> {
        self.calls.borrow_mut().push(Call::Create {
            fields: fields.clone(),
        });
        let summary = fields.get("summary").and_then(Value::as_str).unwrap_or_default();
        if let Some(err) = self.fail_create.borrow().get(summary) {
            return Err(err.clone());
        }

        let number = self.next_number.get();
        self.next_number.set(number + 1);
        let key = format!("{}-{number}", project.key);
        let id = i64::from(number) + 10_000;

        let mut stored = fields.clone();
        stored.insert("status".into(), json!({"name": "Backlog"}));
        stored.insert("creator".into(), json!({"name": "danil1"}));
        stored.insert("created".into(), json!("2020-01-01T09:00:00.000+1000"));
        stored.insert("updated".into(), json!("2020-01-01T09:00:00.000+1000"));
        self.issues.borrow_mut().push(json!({
            "id": id.to_string(),
            "key": key,
            "fields": stored,
        }));
        Ok(CreatedIssue { key, id })
    }

    fn update(
        &self,
        _project: &ProjectMeta,
        key: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), RemoteError> {
        self.calls.borrow_mut().push(Call::Update {
            key: key.to_string(),
            fields: fields.clone(),
        });
        if let Some(err) = self.fail_update.borrow().get(key) {
            return Err(err.clone());
        }
        let mut issues = self.issues.borrow_mut();
        let raw = issues
            .iter_mut()
            .find(|raw| raw["key"] == key)
            .ok_or_else(|| RemoteError::new(Some(404), "Issue Does Not Exist"))?;
        let stored = raw["fields"]
            .as_object_mut()
            .ok_or_else(|| RemoteError::new(Some(500), "bad fields"))?;
        for (name, value) in fields {
            stored.insert(name.clone(), value.clone());
        }
        Ok(())
    }
}
