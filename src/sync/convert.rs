//! Mapping between the remote issue shape and local issue records.
//!
//! Remote issues nest most values in `fields`, wrap users, types and
//! priorities as `{"name": ...}`, and store epic links and estimates in
//! per-project custom fields.

use crate::error::{DeserializeError, JiraError, Result};
use crate::model::{CustomFields, Issue, ProjectMeta};
use crate::serializer::DeserializeOptions;
use chrono::FixedOffset;
use serde_json::{Map, Number, Value as Json, json};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Local fields the remote never accepts in a create or update.
pub const READ_ONLY_FIELDS: &[&str] = &["key", "id", "status", "creator", "created", "updated"];

/// Local fields sent as `{"name": ...}`.
const NAMED_FIELDS: &[&str] = &["assignee", "reporter", "issuetype", "priority"];

/// Plain values copied between the two shapes under the same name.
const PLAIN_FIELDS: &[&str] = &["summary", "description", "labels", "created", "updated"];

/// Convert a remote issue into a local issue whose baseline is that state.
pub fn jiraapi_object_to_issue(
    project: &ProjectMeta,
    raw: &Json,
    tz: Option<FixedOffset>,
) -> Result<Issue> {
    let fields = raw
        .get("fields")
        .and_then(Json::as_object)
        .ok_or_else(|| DeserializeError::missing("fields"))?;

    let mut local = Map::new();
    local.insert("key".into(), raw.get("key").cloned().unwrap_or(Json::Null));
    local.insert("id".into(), raw.get("id").cloned().unwrap_or(Json::Null));
    local.insert("project".into(), Json::String(project.key.clone()));

    for name in PLAIN_FIELDS {
        if let Some(value) = fields.get(*name) {
            local.insert((*name).to_string(), value.clone());
        }
    }
    for name in NAMED_FIELDS.iter().chain(["status", "creator"].iter()) {
        local.insert((*name).to_string(), name_of(fields.get(*name)));
    }

    let versions: Vec<Json> = fields
        .get("fixVersions")
        .and_then(Json::as_array)
        .map(|items| items.iter().map(|v| name_of(Some(v))).filter(|v| !v.is_null()).collect())
        .unwrap_or_default();
    local.insert("fix_versions".into(), Json::Array(versions));

    for name in CustomFields::NAMES {
        if let Some(id) = project.custom_fields.remote_id(name) {
            if let Some(value) = fields.get(id) {
                local.insert(name.to_string(), value.clone());
            }
        }
    }

    let issue = Issue::from_remote(&Json::Object(local), &DeserializeOptions::with_tz(tz))?;
    Ok(issue)
}

fn name_of(value: Option<&Json>) -> Json {
    match value {
        Some(Json::Object(obj)) => obj
            .get("name")
            .or_else(|| obj.get("displayName"))
            .cloned()
            .unwrap_or(Json::Null),
        Some(Json::String(s)) => Json::String(s.clone()),
        _ => Json::Null,
    }
}

/// Fields from `modified` that the remote accepts.
#[must_use]
pub fn pushable_fields(modified: &BTreeSet<String>) -> BTreeSet<String> {
    modified
        .iter()
        .filter(|field| !READ_ONLY_FIELDS.contains(&field.as_str()))
        .cloned()
        .collect()
}

/// Build the remote field map for `fields` of `issue`.
///
/// # Errors
///
/// Returns `FieldNotConfigured` when a custom-field value is requested but
/// the project has no id for it.
pub fn issue_to_jiraapi_update(
    project: &ProjectMeta,
    issue: &Issue,
    fields: &BTreeSet<String>,
) -> Result<Map<String, Json>> {
    let mut out = Map::new();

    for field in fields {
        let field = field.as_str();
        match field {
            "project" => {
                out.insert("project".into(), json!({"key": issue.project}));
            }
            "summary" => {
                out.insert("summary".into(), Json::String(issue.summary.clone()));
            }
            "description" => {
                out.insert("description".into(), optional(issue.description.as_deref()));
            }
            "issuetype" => {
                out.insert("issuetype".into(), json!({"name": issue.issuetype}));
            }
            "assignee" | "reporter" | "priority" => {
                let value = match field {
                    "assignee" => issue.assignee.as_deref(),
                    "reporter" => issue.reporter.as_deref(),
                    _ => issue.priority.as_deref(),
                };
                out.insert(
                    field.to_string(),
                    value.map_or(Json::Null, |name| json!({"name": name})),
                );
            }
            "labels" => {
                out.insert("labels".into(), json!(issue.labels));
            }
            "fix_versions" => {
                let versions: Vec<Json> = issue
                    .fix_versions
                    .iter()
                    .map(|name| json!({"name": name}))
                    .collect();
                out.insert("fixVersions".into(), Json::Array(versions));
            }
            "epic_ref" | "epic_name" | "estimate" => {
                let id = project.custom_fields.remote_id(field).ok_or_else(|| {
                    JiraError::FieldNotConfigured {
                        project: project.key.clone(),
                        message: format!("no custom field is mapped for {field}"),
                    }
                })?;
                let value = match field {
                    "epic_ref" => optional(issue.epic_ref.as_deref()),
                    "epic_name" => optional(issue.epic_name.as_deref()),
                    _ => issue
                        .estimate
                        .and_then(|d| Number::from_str(&d.normalize().to_string()).ok())
                        .map_or(Json::Null, Json::Number),
                };
                out.insert(id.to_string(), value);
            }
            _ => {}
        }
    }

    Ok(out)
}

fn optional(value: Option<&str>) -> Json {
    value.map_or(Json::Null, |s| Json::String(s.to_string()))
}
