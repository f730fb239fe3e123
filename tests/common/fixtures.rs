#![allow(dead_code)]

use jira_offline::model::{CustomFields, Issue, IssueTypeMeta, ProjectMeta, ProjectRegistry};
use jira_offline::serializer::DeserializeOptions;
use serde_json::{Value, json};

pub const EPIC_LINK: &str = "customfield_10100";
pub const EPIC_NAME: &str = "customfield_10200";
pub const STORY_POINTS: &str = "customfield_10300";

pub fn project() -> ProjectMeta {
    let mut meta = ProjectMeta::new("TEST");
    meta.name = Some("Test Project".to_string());
    meta.jira_server = Some("jira.example.com".to_string());
    meta.custom_fields = CustomFields {
        epic_ref: Some(EPIC_LINK.to_string()),
        epic_name: Some(EPIC_NAME.to_string()),
        estimate: Some(STORY_POINTS.to_string()),
    };
    for name in ["Story", "Epic", "Bug", "Delivery Risk"] {
        meta.issuetypes.insert(
            name.to_string(),
            IssueTypeMeta {
                name: name.to_string(),
                priorities: ["High", "Normal", "Low"]
                    .iter()
                    .map(|p| (*p).to_string())
                    .collect(),
            },
        );
    }
    meta
}

pub fn registry() -> ProjectRegistry {
    std::iter::once(project()).collect()
}

/// A remote issue in the tracker's own shape.
pub fn remote_issue(key: &str, id: i64) -> Value {
    json!({
        "id": id.to_string(),
        "key": key,
        "fields": {
            "assignee": {"name": "danil1"},
            "created": "2018-09-24T08:44:06.000+1000",
            "creator": {"name": "danil1"},
            "description": "This is a story or issue",
            "fixVersions": [{"name": "0.1"}],
            "issuetype": {"name": "Story"},
            "labels": [],
            "priority": {"name": "Normal"},
            "project": {"key": "TEST"},
            "reporter": {"name": "danil1"},
            "status": {"name": "Story Done"},
            "summary": "This is the story summary",
            "updated": "2019-08-20T16:41:19.000+1000",
            (EPIC_LINK): "TEST-1",
        }
    })
}

/// `TEST-71` with a clean baseline.
pub fn issue_1() -> Issue {
    Issue::from_remote(
        &json!({
            "assignee": "danil1",
            "created": "2018-09-24T08:44:06.000+10:00",
            "creator": "danil1",
            "description": "This is a story or issue",
            "fix_versions": ["0.1"],
            "issuetype": "Story",
            "id": "1231",
            "key": "TEST-71",
            "labels": [],
            "priority": "Normal",
            "project": "TEST",
            "reporter": "danil1",
            "status": "Story Done",
            "summary": "This is the story summary",
            "updated": "2019-08-20T16:41:19.000+10:00",
            "epic_ref": "TEST-1",
        }),
        &DeserializeOptions::default(),
    )
    .expect("fixture issue")
}

/// `TEST-72`: open, no fix versions.
pub fn issue_2() -> Issue {
    let mut issue = issue_1();
    issue.key = "TEST-72".to_string();
    issue.id = Some(1235);
    issue.status = Some("Backlog".to_string());
    issue.fix_versions.clear();
    issue.mark_synced();
    issue
}

/// `TEST-73`: open, no epic.
pub fn issue_missing_epic() -> Issue {
    let mut issue = issue_2();
    issue.key = "TEST-73".to_string();
    issue.id = Some(1236);
    issue.assignee = None;
    issue.epic_ref = None;
    issue.mark_synced();
    issue
}

/// A locally created story, never pushed.
pub fn issue_new() -> Issue {
    let mut issue = Issue::new_placeholder("TEST", "Story", "This is the story summary");
    issue.description = Some("This is a story or issue".to_string());
    issue.fix_versions.insert("0.1".to_string());
    issue.epic_ref = Some("TEST-1".to_string());
    issue
}

/// A locally created epic, never pushed.
pub fn epic_new() -> Issue {
    let mut issue = Issue::new_placeholder("TEST", "Epic", "This is an epic");
    issue.epic_name = Some("0.1: Epic about a thing".to_string());
    issue
}
