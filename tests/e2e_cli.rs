mod common;

use common::cli::{JiraWorkspace, extract_json_payload, run_jira};
use common::fixtures;
use jira_offline::store::Store;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;

fn seeded_workspace() -> JiraWorkspace {
    let workspace = JiraWorkspace::new();
    fixtures::registry()
        .save(&workspace.projects_path())
        .expect("save registry");
    let mut store = Store::new(workspace.cache_path());
    store.insert(fixtures::issue_1()).expect("insert");
    store.insert(fixtures::issue_2()).expect("insert");
    store.insert(fixtures::issue_missing_epic()).expect("insert");
    store.persist().expect("persist");
    workspace
}

fn json_stdout(workspace: &JiraWorkspace, args: &[&str], label: &str) -> Value {
    let mut full: Vec<&str> = args.to_vec();
    full.push("--json");
    let run = run_jira(workspace, full, label);
    assert!(run.status.success(), "{label} failed: {}", run.stderr);
    serde_json::from_str(&extract_json_payload(&run.stdout)).expect("parse json")
}

fn keys(rows: &Value) -> Vec<String> {
    rows.as_array()
        .expect("array")
        .iter()
        .map(|row| row["key"].as_str().expect("key").to_string())
        .collect()
}

#[test]
fn e2e_ls_filters_closed_and_modified() {
    let _log = common::test_log("e2e_ls_filters_closed_and_modified");
    let workspace = seeded_workspace();

    let open = json_stdout(&workspace, &["ls"], "ls_open");
    assert_eq!(keys(&open), vec!["TEST-72", "TEST-73"]);

    let all = json_stdout(&workspace, &["ls", "--all"], "ls_all");
    assert_eq!(keys(&all), vec!["TEST-71", "TEST-72", "TEST-73"]);

    let modified = json_stdout(&workspace, &["ls", "--modified"], "ls_modified");
    assert!(keys(&modified).is_empty());

    let text = run_jira(&workspace, ["ls"], "ls_text");
    assert!(text.status.success(), "ls failed: {}", text.stderr);
    let header = text.stdout.lines().next().unwrap_or_default();
    assert!(header.starts_with("key"), "header: {header}");
    assert!(text.stdout.contains("TEST-72"));
    assert!(!text.stdout.contains("TEST-71"));
}

#[test]
fn e2e_new_then_edit_then_show() {
    let _log = common::test_log("e2e_new_then_edit_then_show");
    let workspace = seeded_workspace();

    let created = json_stdout(
        &workspace,
        &[
            "new",
            "TEST",
            "Story",
            "Write the docs",
            "--priority",
            "High",
            "--fix-versions",
            "0.1,0.2",
        ],
        "new_story",
    );
    let key = created["key"].as_str().expect("key").to_string();
    assert_eq!(created["project"], "TEST");

    let modified = json_stdout(&workspace, &["ls", "--modified"], "ls_after_new");
    assert_eq!(keys(&modified), vec![key.clone()]);
    assert_eq!(modified[0]["is_new"], true);

    let short = &key[..8];
    let edit = run_jira(
        &workspace,
        ["edit", short, "--assignee", "hoganp"],
        "edit_short_key",
    );
    assert!(edit.status.success(), "edit failed: {}", edit.stderr);
    assert!(edit.stdout.contains("hoganp"));

    let shown = json_stdout(&workspace, &["show", key.as_str()], "show_new");
    assert_eq!(shown["assignee"], "hoganp");
    assert_eq!(shown["summary"], "Write the docs");
    assert_eq!(shown["fix_versions"], serde_json::json!(["0.1", "0.2"]));

    let text = run_jira(&workspace, ["show", key.as_str()], "show_new_text");
    assert!(text.stdout.contains("Not yet pushed"));
}

#[test]
fn e2e_edit_marks_field_modified() {
    let _log = common::test_log("e2e_edit_marks_field_modified");
    let workspace = seeded_workspace();

    let edit = run_jira(
        &workspace,
        ["edit", "TEST-72", "--summary", "Tightened summary"],
        "edit_summary",
    );
    assert!(edit.status.success(), "edit failed: {}", edit.stderr);

    let shown = json_stdout(&workspace, &["show", "TEST-72"], "show_edited");
    assert_eq!(shown["summary"], "Tightened summary");
    assert_eq!(shown["modified"], serde_json::json!(["summary"]));

    let text = run_jira(&workspace, ["show", "TEST-72"], "show_edited_text");
    let line = text
        .stdout
        .lines()
        .find(|l| l.contains("Tightened summary"))
        .expect("summary line");
    assert!(line.starts_with('*'), "line: {line}");

    let modified = json_stdout(&workspace, &["ls", "--modified"], "ls_modified_after_edit");
    assert_eq!(keys(&modified), vec!["TEST-72"]);
}

#[test]
fn e2e_invalid_input_exit_codes() {
    let _log = common::test_log("e2e_invalid_input_exit_codes");
    let workspace = seeded_workspace();

    let bad_type = run_jira(&workspace, ["new", "TEST", "Saga", "Summary"], "new_bad_type");
    assert_eq!(bad_type.status.code(), Some(4));
    assert!(bad_type.stderr.contains("VALIDATION_FAILED"), "{}", bad_type.stderr);

    let bad_priority = run_jira(
        &workspace,
        ["new", "TEST", "Story", "Summary", "--priority", "Urgent"],
        "new_bad_priority",
    );
    assert_eq!(bad_priority.status.code(), Some(4));

    let bad_project = run_jira(&workspace, ["new", "EGG", "Story", "Summary"], "new_bad_project");
    assert_eq!(bad_project.status.code(), Some(5));
    assert!(bad_project.stderr.contains("PROJECT_NOT_CONFIGURED"));

    let no_change = run_jira(&workspace, ["edit", "TEST-72"], "edit_no_change");
    assert_eq!(no_change.status.code(), Some(4));

    let unknown = run_jira(&workspace, ["show", "TEST-7"], "show_unknown");
    assert_eq!(unknown.status.code(), Some(3));
    assert!(unknown.stderr.contains("ISSUE_NOT_FOUND"));

    let all = json_stdout(&workspace, &["ls", "--all"], "ls_after_errors");
    assert_eq!(keys(&all).len(), 3);
}

#[test]
fn e2e_corrupt_cache_exit_code() {
    let _log = common::test_log("e2e_corrupt_cache_exit_code");
    let workspace = seeded_workspace();
    let mut text = fs::read_to_string(workspace.cache_path()).expect("read cache");
    text.push_str("{not json\n");
    fs::write(workspace.cache_path(), text).expect("write cache");

    let ls = run_jira(&workspace, ["ls"], "ls_corrupt");
    assert_eq!(ls.status.code(), Some(2));
    assert!(ls.stderr.contains("CACHE_CORRUPT"), "{}", ls.stderr);
}

#[test]
fn e2e_stats_groups() {
    let _log = common::test_log("e2e_stats_groups");
    let workspace = seeded_workspace();

    let stats = json_stdout(&workspace, &["stats"], "stats_all");
    assert_eq!(stats["issuetype"]["Story"], 3);
    assert_eq!(stats["status"]["Backlog"], 2);
    assert_eq!(stats["status"]["Story Done"], 1);
    assert_eq!(stats["fix_versions"]["(none)"], 2);
    assert_eq!(stats["fix_versions"]["0.1"], 1);

    let only = json_stdout(&workspace, &["stats", "status"], "stats_status");
    assert!(only.get("issuetype").is_none());

    let text = run_jira(&workspace, ["stats", "issuetype"], "stats_text");
    assert!(text.status.success());
    assert!(text.stdout.contains("Story"));
}

#[test]
fn e2e_lint_fix_versions() {
    let _log = common::test_log("e2e_lint_fix_versions");
    let workspace = seeded_workspace();

    let report = run_jira(&workspace, ["lint", "fix-versions"], "lint_report");
    assert!(report.status.success(), "lint failed: {}", report.stderr);
    assert!(report.stdout.contains("There are 2 issues failing fix-versions"));

    let missing_value = run_jira(&workspace, ["lint", "--fix", "fix-versions"], "lint_no_value");
    assert_eq!(missing_value.status.code(), Some(4));

    let fix = run_jira(
        &workspace,
        ["lint", "fix-versions", "--fix", "--value", "0.2"],
        "lint_fix",
    );
    assert!(fix.status.success(), "lint fix failed: {}", fix.stderr);
    assert!(fix.stdout.contains("Set 0.2 on 2 issues"));
    assert!(fix.stdout.contains("There are 0 issues failing fix-versions"));

    let modified = json_stdout(&workspace, &["ls", "--modified"], "ls_after_lint");
    assert_eq!(keys(&modified), vec!["TEST-72", "TEST-73"]);

    let epic = json_stdout(&workspace, &["lint", "issues-missing-epic"], "lint_epic");
    assert_eq!(epic["rule"], "issues-missing-epic");
    assert_eq!(epic["fixed"], 0);
    assert_eq!(keys(&epic["remaining"]), vec!["TEST-73"]);
}

#[test]
fn e2e_projects_lists_registry() {
    let _log = common::test_log("e2e_projects_lists_registry");
    let workspace = seeded_workspace();

    let projects = json_stdout(&workspace, &["projects"], "projects_json");
    assert_eq!(keys(&projects), vec!["TEST"]);
    assert_eq!(projects[0]["jira_server"], "jira.example.com");

    let text = run_jira(&workspace, ["projects"], "projects_text");
    assert!(text.stdout.contains("Test Project"));
}

#[test]
fn e2e_help_lists_commands() {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("jira"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ls").and(predicate::str::contains("lint")));
}
