//! Three-way comparison of baseline, local and remote issue records.
//!
//! All three sides are compared in serialized form, field by field. A field
//! conflicts when the local side changed it since the baseline and the
//! remote side changed it to something else.

use crate::model::diff;
use serde_json::{Map, Value as Json};
use std::collections::BTreeSet;

/// Result of a three-way comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Fields changed locally since the baseline.
    pub local_changed: BTreeSet<String>,
    /// Fields changed remotely since the baseline.
    pub remote_changed: BTreeSet<String>,
    /// Fields changed on both sides to different values.
    pub conflicts: BTreeSet<String>,
}

impl MergeOutcome {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// True when the remote still matches the baseline.
    #[must_use]
    pub fn remote_unchanged(&self) -> bool {
        self.remote_changed.is_empty()
    }
}

/// Compare `local` and `remote` against their common `base`.
#[must_use]
pub fn three_way(
    base: &Map<String, Json>,
    local: &Map<String, Json>,
    remote: &Map<String, Json>,
) -> MergeOutcome {
    let local_changed = diff::changed_fields(&diff::diff(base, local));
    let remote_changed = diff::changed_fields(&diff::diff(base, remote));
    let conflicts = local_changed
        .intersection(&remote_changed)
        .filter(|field| local.get(*field) != remote.get(*field))
        .cloned()
        .collect();

    MergeOutcome {
        local_changed,
        remote_changed,
        conflicts,
    }
}

/// Copy `fields` from `local` over `remote`.
///
/// A field absent locally is removed from the result.
#[must_use]
pub fn overlay(
    remote: &Map<String, Json>,
    local: &Map<String, Json>,
    fields: &BTreeSet<String>,
) -> Map<String, Json> {
    let mut merged = remote.clone();
    for field in fields {
        match local.get(field) {
            Some(value) => {
                merged.insert(field.clone(), value.clone());
            }
            None => {
                merged.remove(field);
            }
        }
    }
    merged
}
