//! Core data types for `jira_offline`.
//!
//! This module defines the records kept in the local replica:
//! - `Issue` - One ticket, with its last-known remote snapshot
//! - `ProjectMeta` - Per-project configuration pulled from the remote
//! - `CustomFields` - Semantic field names to remote custom field ids
//! - `IssueTypeMeta` - An issue type and its allowed priorities
//! - `ProjectRegistry` - The set of projects cloned locally

pub mod diff;

pub use diff::{DiffEntry, FieldPath};

use crate::error::{DeserializeError, JiraError, Result};
use crate::impl_record_value;
use crate::serializer::{
    self, DeserializeOptions, Field, Fields, FromValue, Kind, Serializable, ToValue,
};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde_json::{Map, Value as Json};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Issue type name identifying epics.
pub const EPIC: &str = "Epic";

/// Cache record key holding the serialized diff.
pub const DIFF_FIELD: &str = "diff_to_upstream";

const OPT_STRING: Kind = Kind::Optional(&Kind::String);
const STRING_SET: Kind = Kind::Set(&Kind::String);
const OPT_STRING_SET: Kind = Kind::Optional(&STRING_SET);

const ISSUE_FIELDS: &[Field] = &[
    Field::new("key", Kind::String),
    Field::new("id", Kind::Optional(&Kind::Integer)),
    Field::new("project", Kind::String),
    Field::new("issuetype", Kind::String),
    Field::new("summary", Kind::String),
    Field::new("description", OPT_STRING),
    Field::new("status", OPT_STRING),
    Field::new("assignee", OPT_STRING),
    Field::new("reporter", OPT_STRING),
    Field::new("creator", OPT_STRING),
    Field::new("priority", OPT_STRING),
    Field::new("labels", OPT_STRING_SET),
    Field::new("fix_versions", OPT_STRING_SET),
    Field::new("epic_ref", OPT_STRING),
    Field::new("epic_name", OPT_STRING),
    Field::new("estimate", Kind::Optional(&Kind::Decimal)),
    Field::new("created", Kind::Optional(&Kind::DateTime)),
    Field::new("updated", Kind::Optional(&Kind::DateTime)),
];

/// One ticket in the local replica.
///
/// The working copy is the struct itself. `server_object` is the issue as
/// last seen on the remote; `None` marks an issue that was never pushed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Issue {
    /// Remote key, or a placeholder for issues not yet created.
    pub key: String,
    pub id: Option<i64>,
    pub project: String,
    pub issuetype: String,
    pub summary: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub creator: Option<String>,
    pub priority: Option<String>,
    pub labels: BTreeSet<String>,
    pub fix_versions: BTreeSet<String>,
    /// Key of the parent epic.
    pub epic_ref: Option<String>,
    /// Only meaningful on epics.
    pub epic_name: Option<String>,
    pub estimate: Option<Decimal>,
    pub created: Option<DateTime<FixedOffset>>,
    pub updated: Option<DateTime<FixedOffset>>,
    pub server_object: Option<Box<Issue>>,
}

impl Serializable for Issue {
    fn schema() -> &'static [Field] {
        ISSUE_FIELDS
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("key", &self.key)
            .with("id", &self.id)
            .with("project", &self.project)
            .with("issuetype", &self.issuetype)
            .with("summary", &self.summary)
            .with("description", &self.description)
            .with("status", &self.status)
            .with("assignee", &self.assignee)
            .with("reporter", &self.reporter)
            .with("creator", &self.creator)
            .with("priority", &self.priority)
            .with("labels", &self.labels)
            .with("fix_versions", &self.fix_versions)
            .with("epic_ref", &self.epic_ref)
            .with("epic_name", &self.epic_name)
            .with("estimate", &self.estimate)
            .with("created", &self.created)
            .with("updated", &self.updated)
    }

    fn from_fields(mut fields: Fields) -> std::result::Result<Self, DeserializeError> {
        Ok(Self {
            key: fields.take("key")?,
            id: fields.take("id")?,
            project: fields.take("project")?,
            issuetype: fields.take("issuetype")?,
            summary: fields.take("summary")?,
            description: fields.take("description")?,
            status: fields.take("status")?,
            assignee: fields.take("assignee")?,
            reporter: fields.take("reporter")?,
            creator: fields.take("creator")?,
            priority: fields.take("priority")?,
            labels: fields.take("labels")?,
            fix_versions: fields.take("fix_versions")?,
            epic_ref: fields.take("epic_ref")?,
            epic_name: fields.take("epic_name")?,
            estimate: fields.take("estimate")?,
            created: fields.take("created")?,
            updated: fields.take("updated")?,
            server_object: None,
        })
    }
}

impl Issue {
    /// Create a never-pushed issue under a fresh placeholder key.
    #[must_use]
    pub fn new_placeholder(project: &str, issuetype: &str, summary: &str) -> Self {
        Self {
            key: crate::util::placeholder_key(),
            project: project.to_string(),
            issuetype: issuetype.to_string(),
            summary: summary.to_string(),
            ..Self::default()
        }
    }

    /// Build an issue from remote-origin data and take it as the baseline.
    pub fn from_remote(
        input: &Json,
        opts: &DeserializeOptions,
    ) -> std::result::Result<Self, DeserializeError> {
        let mut issue: Self = serializer::deserialize(input, opts)?;
        issue.mark_synced();
        Ok(issue)
    }

    /// Build an issue from one cache record.
    ///
    /// The record is the working copy plus its diff; the baseline is
    /// rebuilt by reverting the diff. Records without an `id` are new.
    pub fn from_cache(input: &Json, projects: &ProjectRegistry) -> Result<Self> {
        let mut issue: Self = serializer::deserialize(input, &DeserializeOptions::default())?;
        if projects.get(&issue.project).is_none() {
            return Err(JiraError::ProjectDoesntExist {
                project: issue.project,
            });
        }

        if issue.id.is_some() {
            let entries: Vec<DiffEntry> = match input.get(DIFF_FIELD) {
                Some(raw) if !raw.is_null() => serde_json::from_value(raw.clone())?,
                _ => Vec::new(),
            };
            let base = diff::revert(&entries, &serializer::serialize(&issue));
            let opts = DeserializeOptions::default().ignoring_missing();
            let upstream: Self = serializer::deserialize(&Json::Object(base), &opts)
                .map_err(|e| e.in_field("server_object"))?;
            issue.server_object = Some(Box::new(upstream));
        }
        Ok(issue)
    }

    /// Serialize the working copy, adding the diff when there is one.
    pub fn serialize(&self) -> Result<Map<String, Json>> {
        let mut record = serializer::serialize(self);
        let entries = self.diff_to_upstream();
        if !entries.is_empty() {
            record.insert(DIFF_FIELD.to_string(), serde_json::to_value(entries)?);
        }
        Ok(record)
    }

    /// Structural diff from the baseline to the working copy.
    ///
    /// A new issue diffs against the empty record.
    #[must_use]
    pub fn diff_to_upstream(&self) -> Vec<DiffEntry> {
        diff::diff(&self.upstream_record(), &serializer::serialize(self))
    }

    /// Serialized baseline; empty for new issues.
    #[must_use]
    pub fn upstream_record(&self) -> Map<String, Json> {
        self.server_object
            .as_deref()
            .map(serializer::serialize)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_local_changes(&self) -> bool {
        !self.diff_to_upstream().is_empty()
    }

    /// Names of the fields changed since the baseline.
    #[must_use]
    pub fn modified_fields(&self) -> BTreeSet<String> {
        diff::changed_fields(&self.diff_to_upstream())
    }

    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.server_object.is_none()
    }

    #[must_use]
    pub fn is_epic(&self) -> bool {
        self.issuetype == EPIC
    }

    /// Open unless the status is one of `closed`; an unknown status is open.
    #[must_use]
    pub fn is_open(&self, closed: &[String]) -> bool {
        self.status
            .as_ref()
            .is_none_or(|status| !closed.iter().any(|c| c == status))
    }

    /// The working copy without its baseline.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self {
            server_object: None,
            ..self.clone()
        }
    }

    /// Take the current working copy as the new baseline.
    pub fn mark_synced(&mut self) {
        self.server_object = Some(Box::new(self.snapshot()));
    }
}

/// Remote custom field ids for fields Jira does not model natively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomFields {
    pub epic_ref: Option<String>,
    pub epic_name: Option<String>,
    pub estimate: Option<String>,
}

const CUSTOM_FIELDS: &[Field] = &[
    Field::new("epic_ref", OPT_STRING),
    Field::new("epic_name", OPT_STRING),
    Field::new("estimate", OPT_STRING),
];

impl Serializable for CustomFields {
    fn schema() -> &'static [Field] {
        CUSTOM_FIELDS
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("epic_ref", &self.epic_ref)
            .with("epic_name", &self.epic_name)
            .with("estimate", &self.estimate)
    }

    fn from_fields(mut fields: Fields) -> std::result::Result<Self, DeserializeError> {
        Ok(Self {
            epic_ref: fields.take("epic_ref")?,
            epic_name: fields.take("epic_name")?,
            estimate: fields.take("estimate")?,
        })
    }
}

impl_record_value!(CustomFields);

impl CustomFields {
    /// Remote id for a semantic field name, if it maps to a custom field.
    #[must_use]
    pub fn remote_id(&self, field: &str) -> Option<&str> {
        match field {
            "epic_ref" => self.epic_ref.as_deref(),
            "epic_name" => self.epic_name.as_deref(),
            "estimate" => self.estimate.as_deref(),
            _ => None,
        }
    }

    /// Semantic names served by custom fields.
    pub const NAMES: [&'static str; 3] = ["epic_ref", "epic_name", "estimate"];

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.epic_ref.is_some() && self.epic_name.is_some() && self.estimate.is_some()
    }
}

/// An issue type and the priorities it accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueTypeMeta {
    pub name: String,
    pub priorities: BTreeSet<String>,
}

const ISSUE_TYPE_FIELDS: &[Field] = &[
    Field::new("name", Kind::String),
    Field::new("priorities", OPT_STRING_SET),
];

impl Serializable for IssueTypeMeta {
    fn schema() -> &'static [Field] {
        ISSUE_TYPE_FIELDS
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("name", &self.name)
            .with("priorities", &self.priorities)
    }

    fn from_fields(mut fields: Fields) -> std::result::Result<Self, DeserializeError> {
        Ok(Self {
            name: fields.take("name")?,
            priorities: fields.take("priorities")?,
        })
    }
}

impl_record_value!(IssueTypeMeta);

/// Per-project configuration, read-only during a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMeta {
    pub key: String,
    pub name: Option<String>,
    pub jira_server: Option<String>,
    pub custom_fields: CustomFields,
    pub issuetypes: BTreeMap<String, IssueTypeMeta>,
}

const CUSTOM_FIELDS_KIND: Kind = Kind::Record(CustomFields::schema);
const ISSUE_TYPE_KIND: Kind = Kind::Record(IssueTypeMeta::schema);
const ISSUE_TYPES_KIND: Kind = Kind::Map(&Kind::String, &ISSUE_TYPE_KIND);

const PROJECT_FIELDS: &[Field] = &[
    Field::new("key", Kind::String),
    Field::new("name", OPT_STRING),
    Field::new("jira_server", OPT_STRING),
    Field::new("custom_fields", CUSTOM_FIELDS_KIND),
    Field::new("issuetypes", Kind::Optional(&ISSUE_TYPES_KIND)),
];

impl Serializable for ProjectMeta {
    fn schema() -> &'static [Field] {
        PROJECT_FIELDS
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("key", &self.key)
            .with("name", &self.name)
            .with("jira_server", &self.jira_server)
            .with("custom_fields", &self.custom_fields)
            .with("issuetypes", &self.issuetypes)
    }

    fn from_fields(mut fields: Fields) -> std::result::Result<Self, DeserializeError> {
        Ok(Self {
            key: fields.take("key")?,
            name: fields.take("name")?,
            jira_server: fields.take("jira_server")?,
            custom_fields: fields.take("custom_fields")?,
            issuetypes: fields.take("issuetypes")?,
        })
    }
}

impl_record_value!(ProjectMeta);

impl ProjectMeta {
    #[must_use]
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn issuetype(&self, name: &str) -> Option<&IssueTypeMeta> {
        self.issuetypes.get(name)
    }

    /// Server label used in error messages.
    #[must_use]
    pub fn server_label(&self) -> String {
        self.jira_server
            .clone()
            .unwrap_or_else(|| "unknown server".to_string())
    }
}

const PROJECT_KIND: Kind = Kind::Record(ProjectMeta::schema);
const REGISTRY_KIND: Kind = Kind::Map(&Kind::String, &PROJECT_KIND);

/// Projects cloned into the local replica, keyed by project key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRegistry {
    projects: BTreeMap<String, ProjectMeta>,
}

impl ProjectRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the registry file; a missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        let raw: Json = serde_json::from_str(&text)?;
        let value = serializer::deserialize_value(&REGISTRY_KIND, &raw, &DeserializeOptions::default())?;
        let projects = BTreeMap::<String, ProjectMeta>::from_value(value)?;
        debug!(path = %path.display(), count = projects.len(), "Loaded project registry");
        Ok(Self { projects })
    }

    /// Write the registry file in full.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serializer::serialize_value(&REGISTRY_KIND, &self.projects.to_value());
        let text = serde_json::to_string_pretty(&raw)?;
        crate::util::write_atomic(path, text.as_bytes())?;
        debug!(path = %path.display(), count = self.projects.len(), "Saved project registry");
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ProjectMeta> {
        self.projects.get(key)
    }

    /// Resolve a project, failing when it was never cloned.
    pub fn require(&self, key: &str) -> Result<&ProjectMeta> {
        self.get(key).ok_or_else(|| JiraError::ProjectNotConfigured {
            project: key.to_string(),
        })
    }

    pub fn insert(&mut self, meta: ProjectMeta) {
        self.projects.insert(meta.key.clone(), meta);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProjectMeta> {
        self.projects.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

impl FromIterator<ProjectMeta> for ProjectRegistry {
    fn from_iter<I: IntoIterator<Item = ProjectMeta>>(iter: I) -> Self {
        let mut registry = Self::new();
        for meta in iter {
            registry.insert(meta);
        }
        registry
    }
}
