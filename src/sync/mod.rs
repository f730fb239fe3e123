//! Pull and push between the local store and a remote tracker.
//!
//! Pull pages through the remote search and merges each issue into the
//! store. Push walks the issues with local changes, re-fetches each one,
//! refuses to overwrite conflicting remote edits, and writes the minimal
//! set of changed fields.
//!
//! Both run sequentially and block on every remote call. Push persists the
//! store after each successful issue so an interrupted run keeps the issues
//! already written marked clean.

pub mod conflict;
pub mod convert;
pub mod remote;

pub use conflict::{MergeOutcome, three_way};
pub use remote::{CreatedIssue, IssueTracker, RemoteError, translate_error};

use crate::error::{JiraError, Result};
use crate::model::{CustomFields, Issue, IssueTypeMeta, ProjectMeta, ProjectRegistry};
use crate::serializer::{self, DeserializeOptions};
use crate::store::Store;
use chrono::FixedOffset;
use serde::Serialize;
use serde_json::Value as Json;
use tracing::{debug, info, info_span, warn};

/// Issues requested per search page.
pub const PAGE_SIZE: usize = 25;

/// Collaborators shared by a sync run.
pub struct SyncContext<'a> {
    pub remote: &'a dyn IssueTracker,
    pub projects: &'a ProjectRegistry,
    /// Timezone attached to remote date-times; local time when `None`.
    pub tz: Option<FixedOffset>,
}

impl<'a> SyncContext<'a> {
    #[must_use]
    pub fn new(remote: &'a dyn IssueTracker, projects: &'a ProjectRegistry) -> Self {
        Self {
            remote,
            projects,
            tz: None,
        }
    }

    #[must_use]
    pub fn with_tz(mut self, tz: Option<FixedOffset>) -> Self {
        self.tz = tz;
        self
    }
}

/// Outcome of pulling one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullReport {
    pub project: String,
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Locally modified issues moved onto the new remote baseline.
    pub rebased: usize,
    /// Local edits thrown away by a forced pull.
    pub discarded: usize,
    /// Locally modified issues left untouched because the remote changed
    /// the same fields; push reports them as conflicts.
    pub held: Vec<String>,
}

/// One issue that failed to push.
#[derive(Debug)]
pub struct PushFailure {
    pub key: String,
    pub error: JiraError,
}

/// Outcome of a push run.
#[derive(Debug, Default)]
pub struct PushReport {
    /// Existing issues updated on the remote.
    pub updated: Vec<String>,
    /// New issues created, as (placeholder key, remote key).
    pub created: Vec<(String, String)>,
    /// Issues whose only changes cannot be written remotely.
    pub skipped: Vec<String>,
    pub failures: Vec<PushFailure>,
}

impl PushReport {
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.updated.len() + self.created.len()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

enum Pushed {
    Updated,
    Created { key: String },
    Skipped,
}

/// Fetch a project's create-meta and build its configuration.
///
/// # Errors
///
/// Returns `ProjectDoesntExist` when the remote knows no such project,
/// `EstimateFieldUnavailable` when no story points field exists, and
/// `RemoteApi` for transport failures or malformed metadata.
pub fn bootstrap_project(
    remote: &dyn IssueTracker,
    key: &str,
    jira_server: Option<&str>,
) -> Result<ProjectMeta> {
    let mut meta = ProjectMeta::new(key);
    meta.jira_server = jira_server.map(str::to_string);

    let raw = remote
        .project_meta(&meta)
        .map_err(|e| JiraError::RemoteApi {
            message: format!("Failed retrieving project meta for {key} with error \"{e}\""),
        })?;

    let project = raw
        .get("projects")
        .and_then(Json::as_array)
        .and_then(|projects| projects.first())
        .ok_or_else(|| JiraError::ProjectDoesntExist {
            project: key.to_string(),
        })?;
    let bad_meta = |what: &str| JiraError::RemoteApi {
        message: format!("Missing or bad project meta returned for {key}: {what}"),
    };

    meta.name = project.get("name").and_then(Json::as_str).map(str::to_string);

    let issuetypes = project
        .get("issuetypes")
        .and_then(Json::as_array)
        .ok_or_else(|| bad_meta("issuetypes"))?;

    let mut custom = CustomFields::default();
    for issuetype in issuetypes {
        let name = issuetype
            .get("name")
            .and_then(Json::as_str)
            .ok_or_else(|| bad_meta("issuetype name"))?;
        let priorities = issuetype
            .pointer("/fields/priority/allowedValues")
            .and_then(Json::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.get("name").and_then(Json::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        meta.issuetypes.insert(
            name.to_string(),
            IssueTypeMeta {
                name: name.to_string(),
                priorities,
            },
        );

        if custom.is_complete() {
            continue;
        }
        let Some(fields) = issuetype.get("fields").and_then(Json::as_object) else {
            continue;
        };
        for (field_id, props) in fields {
            let remote_id = props
                .pointer("/schema/customId")
                .and_then(Json::as_i64)
                .map_or_else(|| field_id.clone(), |id| format!("customfield_{id}"));
            let slot = match props.get("name").and_then(Json::as_str) {
                Some("Epic Name") => &mut custom.epic_name,
                Some("Epic Link") => &mut custom.epic_ref,
                Some("Story Points") => &mut custom.estimate,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(remote_id);
            }
        }
    }

    if custom.estimate.is_none() {
        return Err(JiraError::EstimateFieldUnavailable {
            project: key.to_string(),
            server: meta.server_label(),
        });
    }
    meta.custom_fields = custom;

    info!(project = %key, issuetypes = meta.issuetypes.len(), "Fetched project meta");
    Ok(meta)
}

/// Merge remote state for `projects` (every registered project when empty).
///
/// The store is persisted once per project.
///
/// # Errors
///
/// Remote failures and unconvertible remote issues abort the pull.
pub fn pull(
    ctx: &SyncContext<'_>,
    store: &mut Store,
    projects: &[String],
    force: bool,
) -> Result<Vec<PullReport>> {
    let targets: Vec<String> = if projects.is_empty() {
        ctx.projects.keys().map(str::to_string).collect()
    } else {
        projects.to_vec()
    };

    let mut reports = Vec::new();
    for key in targets {
        let project = ctx.projects.require(&key)?;
        let _span = info_span!("pull", project = %key).entered();
        let mut report = PullReport {
            project: key.clone(),
            ..PullReport::default()
        };

        let mut start_at = 0;
        loop {
            let page = ctx
                .remote
                .search(project, start_at, PAGE_SIZE)
                .map_err(|e| translate_error(project, "Failed searching issues", &e))?;
            if page.is_empty() {
                break;
            }
            debug!(start_at, count = page.len(), "Fetched page");
            start_at += page.len();

            for raw in &page {
                let incoming = convert::jiraapi_object_to_issue(project, raw, ctx.tz)?;
                report.fetched += 1;
                merge_pulled(store, incoming, force, &mut report)?;
            }
        }

        store.persist()?;
        info!(
            fetched = report.fetched,
            inserted = report.inserted,
            updated = report.updated,
            rebased = report.rebased,
            held = report.held.len(),
            "Pull complete"
        );
        reports.push(report);
    }
    Ok(reports)
}

/// Merge one pulled issue into the store.
///
/// An issue whose local edits overlap remote edits keeps its old baseline
/// instead of taking the pulled one, so the next push reports the conflict.
fn merge_pulled(
    store: &mut Store,
    incoming: Issue,
    force: bool,
    report: &mut PullReport,
) -> Result<()> {
    let Some(existing) = store.get(&incoming.key) else {
        report.inserted += 1;
        return store.insert(incoming);
    };

    if !existing.has_local_changes() {
        report.updated += 1;
        store.set(incoming);
    } else if force {
        warn!(key = %incoming.key, "Discarding local changes");
        report.discarded += 1;
        store.set(incoming);
    } else if let Some(rebased) = rebase(existing, &incoming)? {
        debug!(key = %incoming.key, "Rebased local changes");
        report.rebased += 1;
        store.set(rebased);
    } else {
        warn!(key = %incoming.key, "Remote changed locally modified fields; keeping local copy");
        report.held.push(incoming.key);
    }
    Ok(())
}

/// Move local edits onto a new remote baseline, or `None` when they overlap
/// remote edits.
fn rebase(existing: &Issue, incoming: &Issue) -> Result<Option<Issue>> {
    let local = serializer::serialize(existing);
    let remote = serializer::serialize(incoming);
    let outcome = three_way(&existing.upstream_record(), &local, &remote);
    if !outcome.is_clean() {
        return Ok(None);
    }

    let merged = conflict::overlay(&remote, &local, &outcome.local_changed);
    let mut issue: Issue =
        serializer::deserialize(&Json::Object(merged), &DeserializeOptions::default())?;
    issue.server_object.clone_from(&incoming.server_object);
    Ok(Some(issue))
}

/// Write every locally modified issue to the remote.
///
/// New epics go first so issues linking to them can be re-pointed at the
/// remote key before they are pushed. A failed issue is recorded in the
/// report and the run moves on.
///
/// # Errors
///
/// Only a failure to persist the store aborts the run.
pub fn push(ctx: &SyncContext<'_>, store: &mut Store) -> Result<PushReport> {
    let _span = info_span!("push").entered();
    let mut keys = store.modified_keys();
    keys.sort_by_key(|key| {
        !store
            .get(key)
            .is_some_and(|issue| issue.is_new() && issue.is_epic())
    });
    info!(count = keys.len(), "Pushing modified issues");

    let mut report = PushReport::default();
    for key in keys {
        let _issue_span = info_span!("push_issue", key = %key).entered();
        match push_issue(ctx, store, &key) {
            Ok(Pushed::Updated) => {
                store.persist()?;
                report.updated.push(key);
            }
            Ok(Pushed::Created { key: remote_key }) => {
                store.persist()?;
                info!(remote_key = %remote_key, "Created issue");
                report.created.push((key, remote_key));
            }
            Ok(Pushed::Skipped) => report.skipped.push(key),
            Err(error) => {
                warn!(error = %error, "Push failed");
                report.failures.push(PushFailure { key, error });
            }
        }
    }

    info!(
        updated = report.updated.len(),
        created = report.created.len(),
        failed = report.failures.len(),
        "Push complete"
    );
    Ok(report)
}

fn push_issue(ctx: &SyncContext<'_>, store: &mut Store, key: &str) -> Result<Pushed> {
    let issue = store.require(key)?.clone();
    let project = ctx.projects.require(&issue.project)?;
    if issue.is_new() {
        create_issue(ctx, store, project, &issue)
    } else {
        update_issue(ctx, store, project, &issue)
    }
}

fn update_issue(
    ctx: &SyncContext<'_>,
    store: &mut Store,
    project: &ProjectMeta,
    issue: &Issue,
) -> Result<Pushed> {
    let raw = ctx
        .remote
        .fetch(project, &issue.key)
        .map_err(|e| translate_error(project, &format!("Failed fetching {}", issue.key), &e))?;
    let fresh = convert::jiraapi_object_to_issue(project, &raw, ctx.tz)?;

    let local = serializer::serialize(issue);
    let remote = serializer::serialize(&fresh);
    let outcome = three_way(&issue.upstream_record(), &local, &remote);
    if !outcome.is_clean() {
        return Err(JiraError::Conflict {
            key: issue.key.clone(),
            fields: outcome.conflicts.into_iter().collect(),
        });
    }
    if !outcome.remote_unchanged() {
        debug!(remote_changed = ?outcome.remote_changed, "Merging remote edits");
    }

    let fields = convert::pushable_fields(&outcome.local_changed);
    if fields.is_empty() {
        warn!("No remotely writable changes; skipping");
        return Ok(Pushed::Skipped);
    }

    let payload = convert::issue_to_jiraapi_update(project, issue, &fields)?;
    ctx.remote
        .update(project, &issue.key, &payload)
        .map_err(|e| translate_error(project, &format!("Failed updating {}", issue.key), &e))?;

    // Remote now holds its own edits plus ours; unpushable local edits stay pending.
    let opts = DeserializeOptions::default();
    let working = conflict::overlay(&remote, &local, &outcome.local_changed);
    let canonical = conflict::overlay(&remote, &local, &fields);
    let mut updated: Issue = serializer::deserialize(&Json::Object(working), &opts)?;
    let baseline: Issue = serializer::deserialize(&Json::Object(canonical), &opts)?;
    updated.server_object = Some(Box::new(baseline));
    store.set(updated);

    debug!(fields = ?fields, "Updated issue");
    Ok(Pushed::Updated)
}

fn create_issue(
    ctx: &SyncContext<'_>,
    store: &mut Store,
    project: &ProjectMeta,
    issue: &Issue,
) -> Result<Pushed> {
    let mut missing = Vec::new();
    if issue.summary.trim().is_empty() {
        missing.push("summary".to_string());
    }
    if issue.issuetype.trim().is_empty() {
        missing.push("issuetype".to_string());
    }
    if !missing.is_empty() {
        return Err(JiraError::MissingFieldsForNewIssue {
            key: issue.key.clone(),
            missing,
        });
    }

    let mut fields = convert::pushable_fields(&issue.modified_fields());
    fields.insert("project".to_string());
    let payload = convert::issue_to_jiraapi_update(project, issue, &fields)?;

    let context = format!(
        "Failed creating new {} \"{}\"",
        issue.issuetype, issue.summary
    );
    let created = ctx
        .remote
        .create(project, &payload)
        .map_err(|e| translate_error(project, &context, &e))?;

    let fetched = ctx
        .remote
        .fetch(project, &created.key)
        .map_err(|e| e.to_string())
        .and_then(|raw| {
            convert::jiraapi_object_to_issue(project, &raw, ctx.tz).map_err(|e| e.to_string())
        });
    let canonical = match fetched {
        Ok(issue) => issue,
        Err(reason) => {
            warn!(remote_key = %created.key, error = %reason, "Could not fetch created issue; using local copy");
            let mut local = issue.snapshot();
            local.key.clone_from(&created.key);
            local.id = Some(created.id);
            local.mark_synced();
            local
        }
    };

    store.rename_key(&issue.key, &created.key)?;
    let is_epic = canonical.is_epic();
    store.set(canonical);

    if is_epic {
        relink_epic(store, &issue.key, &created.key);
    }
    Ok(Pushed::Created { key: created.key })
}

/// Point every issue linked to `placeholder` at `remote_key`.
fn relink_epic(store: &mut Store, placeholder: &str, remote_key: &str) {
    let linked: Vec<String> = store
        .iter()
        .filter(|issue| issue.epic_ref.as_deref() == Some(placeholder))
        .map(|issue| issue.key.clone())
        .collect();

    for key in &linked {
        if let Some(issue) = store.get_mut(key) {
            issue.epic_ref = Some(remote_key.to_string());
        }
    }
    if !linked.is_empty() {
        info!(epic = %remote_key, count = linked.len(), "Relinked issues to new epic");
    }
}
