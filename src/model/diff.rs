//! Structural diff between two serialized records.
//!
//! Records are compared in their serialized JSON form, field by field.
//! Array-valued fields (sets) are compared member by member so a single
//! label added to `labels` is one `Added` entry, not a rewrite of the field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::BTreeSet;

/// Location of a change: a field, or one member of an array field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPath {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<Json>,
}

impl FieldPath {
    #[must_use]
    pub fn field(name: &str) -> Self {
        Self {
            field: name.to_string(),
            member: None,
        }
    }

    #[must_use]
    pub fn member(name: &str, member: Json) -> Self {
        Self {
            field: name.to_string(),
            member: Some(member),
        }
    }
}

/// One field-level change from upstream to current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DiffEntry {
    Added { path: FieldPath, value: Json },
    Removed { path: FieldPath, value: Json },
    Changed { path: FieldPath, old: Json, new: Json },
}

impl DiffEntry {
    #[must_use]
    pub const fn path(&self) -> &FieldPath {
        match self {
            Self::Added { path, .. } | Self::Removed { path, .. } | Self::Changed { path, .. } => {
                path
            }
        }
    }
}

/// Diff `old` against `new`, in field-name order.
#[must_use]
pub fn diff(old: &Map<String, Json>, new: &Map<String, Json>) -> Vec<DiffEntry> {
    let names: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    let mut entries = Vec::new();

    for name in names {
        let before = old.get(name);
        let after = new.get(name);
        if before == after {
            continue;
        }

        if is_array_field(before, after) {
            let members = diff_members(name, before, after);
            if !members.is_empty() {
                entries.extend(members);
                continue;
            }
        }

        let path = FieldPath::field(name);
        entries.push(match (before, after) {
            (None, Some(value)) => DiffEntry::Added {
                path,
                value: value.clone(),
            },
            (Some(value), None) => DiffEntry::Removed {
                path,
                value: value.clone(),
            },
            (Some(old), Some(new)) => DiffEntry::Changed {
                path,
                old: old.clone(),
                new: new.clone(),
            },
            (None, None) => continue,
        });
    }
    entries
}

fn is_array_field(before: Option<&Json>, after: Option<&Json>) -> bool {
    matches!(
        (before, after),
        (Some(Json::Array(_)), Some(Json::Array(_)) | None) | (None, Some(Json::Array(_)))
    )
}

fn diff_members(name: &str, before: Option<&Json>, after: Option<&Json>) -> Vec<DiffEntry> {
    let empty = Vec::new();
    let before = before.and_then(Json::as_array).unwrap_or(&empty);
    let after = after.and_then(Json::as_array).unwrap_or(&empty);

    let removed = before.iter().filter(|m| !after.contains(m)).map(|m| DiffEntry::Removed {
        path: FieldPath::member(name, m.clone()),
        value: m.clone(),
    });
    let added = after.iter().filter(|m| !before.contains(m)).map(|m| DiffEntry::Added {
        path: FieldPath::member(name, m.clone()),
        value: m.clone(),
    });
    removed.chain(added).collect()
}

/// Rebuild the upstream record from the current record and its diff.
#[must_use]
pub fn revert(entries: &[DiffEntry], current: &Map<String, Json>) -> Map<String, Json> {
    let mut record = current.clone();
    for entry in entries {
        match entry {
            DiffEntry::Added { path, .. } => match &path.member {
                Some(member) => remove_member(&mut record, &path.field, member),
                None => {
                    record.remove(&path.field);
                }
            },
            DiffEntry::Removed { path, value } => match &path.member {
                Some(member) => insert_member(&mut record, &path.field, member),
                None => {
                    record.insert(path.field.clone(), value.clone());
                }
            },
            DiffEntry::Changed { path, old, .. } => {
                record.insert(path.field.clone(), old.clone());
            }
        }
    }
    record
}

fn remove_member(record: &mut Map<String, Json>, field: &str, member: &Json) {
    if let Some(Json::Array(items)) = record.get_mut(field) {
        items.retain(|item| item != member);
        if items.is_empty() {
            record.remove(field);
        }
    }
}

fn insert_member(record: &mut Map<String, Json>, field: &str, member: &Json) {
    let slot = record
        .entry(field.to_string())
        .or_insert_with(|| Json::Array(Vec::new()));
    if let Json::Array(items) = slot {
        if !items.contains(member) {
            items.push(member.clone());
            items.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
        }
    }
}

/// Names of the fields touched by a diff.
#[must_use]
pub fn changed_fields(entries: &[DiffEntry]) -> BTreeSet<String> {
    entries
        .iter()
        .map(|entry| entry.path().field.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Json) -> Map<String, Json> {
        match value {
            Json::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_equal_records_have_empty_diff() {
        let a = record(json!({"summary": "x", "labels": ["a"]}));
        assert!(diff(&a, &a.clone()).is_empty());
    }

    #[test]
    fn test_single_changed_field() {
        let old = record(json!({"summary": "old", "assignee": "danil1"}));
        let new = record(json!({"summary": "new", "assignee": "danil1"}));
        assert_eq!(
            diff(&old, &new),
            vec![DiffEntry::Changed {
                path: FieldPath::field("summary"),
                old: json!("old"),
                new: json!("new"),
            }]
        );
    }

    #[test]
    fn test_set_members() {
        let old = record(json!({"fix_versions": ["0.1", "0.2"]}));
        let new = record(json!({"fix_versions": ["0.1", "0.3"]}));
        let entries = diff(&old, &new);
        assert_eq!(entries.len(), 2);
        assert!(matches!(&entries[0], DiffEntry::Removed { path, .. } if path.member == Some(json!("0.2"))));
        assert!(matches!(&entries[1], DiffEntry::Added { path, .. } if path.member == Some(json!("0.3"))));
        assert_eq!(changed_fields(&entries).len(), 1);
    }

    #[test]
    fn test_set_emptied_is_member_removal() {
        let old = record(json!({"labels": ["a", "b"]}));
        let new = record(json!({}));
        let entries = diff(&old, &new);
        assert_eq!(entries.len(), 2);
        assert_eq!(revert(&entries, &new), old);
    }

    #[test]
    fn test_revert_restores_upstream() {
        let old = record(json!({
            "summary": "old",
            "status": "Backlog",
            "labels": ["b", "d"],
        }));
        let new = record(json!({
            "summary": "new",
            "assignee": "hoganp",
            "labels": ["a", "b", "c"],
        }));
        let entries = diff(&old, &new);
        assert_eq!(revert(&entries, &new), old);
    }

    #[test]
    fn test_diff_entry_json_shape() {
        let entry = DiffEntry::Changed {
            path: FieldPath::field("assignee"),
            old: json!("danil1"),
            new: json!("hoganp"),
        };
        let encoded = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            encoded,
            json!({"op": "changed", "path": {"field": "assignee"}, "old": "danil1", "new": "hoganp"})
        );
        let decoded: DiffEntry = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, entry);
    }
}
