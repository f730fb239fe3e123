//! Property tests for the cache format and date-time handling.

mod common;

use chrono::{FixedOffset, TimeZone};
use common::{TestData, fixtures};
use jira_offline::model::Issue;
use jira_offline::serializer::datetime::{format_datetime, parse_datetime};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
struct Edit {
    summary: Option<String>,
    assignee: Option<Option<String>>,
    labels: BTreeSet<String>,
    fix_versions: BTreeSet<String>,
    estimate: Option<Decimal>,
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    (
        proptest::option::of("[A-Za-z ]{1,20}"),
        proptest::option::of(proptest::option::of("[a-z]{3,8}")),
        proptest::collection::btree_set("[a-z]{1,6}", 0..4),
        proptest::collection::btree_set("[0-9]\\.[0-9]", 0..3),
        proptest::option::of((0i64..10_000, 0u32..3)),
    )
        .prop_map(|(summary, assignee, labels, fix_versions, estimate)| Edit {
            summary,
            assignee,
            labels,
            fix_versions,
            estimate: estimate.map(|(m, s)| Decimal::new(m, s)),
        })
}

fn apply(issue: &mut Issue, edit: &Edit) {
    if let Some(summary) = &edit.summary {
        issue.summary.clone_from(summary);
    }
    if let Some(assignee) = &edit.assignee {
        issue.assignee.clone_from(assignee);
    }
    issue.labels.clone_from(&edit.labels);
    issue.fix_versions.clone_from(&edit.fix_versions);
    issue.estimate = edit.estimate;
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn cache_reload_rebuilds_baseline(edit in edit_strategy()) {
        let data = TestData::new();
        let mut store = data.store();
        let mut issue = fixtures::issue_1();
        apply(&mut issue, &edit);
        let expected_modified = issue.modified_fields();
        store.insert(issue.clone()).unwrap();
        store.persist().unwrap();

        let loaded = data.reload();
        let back = loaded.get("TEST-71").unwrap();
        prop_assert_eq!(back, &issue);
        let fixture = fixtures::issue_1();
        prop_assert_eq!(back.server_object.as_deref(), fixture.server_object.as_deref());
        prop_assert_eq!(back.modified_fields(), expected_modified);
    }

    #[test]
    fn datetime_format_parse_keeps_instant_and_offset(
        secs in 0i64..4_000_000_000,
        offset_quarters in -48i32..=56,
    ) {
        let offset = FixedOffset::east_opt(offset_quarters * 900).unwrap();
        let dt = offset.timestamp_opt(secs, 0).unwrap();
        let text = format_datetime(&dt);
        let parsed = parse_datetime(&text, None).unwrap();
        prop_assert_eq!(parsed, dt);
        prop_assert_eq!(parsed.offset(), dt.offset());
    }

    #[test]
    fn jira_offset_spelling_matches_rfc3339(
        secs in 0i64..4_000_000_000,
        hours in -11i32..=12,
    ) {
        let offset = FixedOffset::east_opt(hours * 3600).unwrap();
        let dt = offset.timestamp_opt(secs, 0).unwrap();
        let jira = dt.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string();
        prop_assert_eq!(parse_datetime(&jira, None).unwrap(), dt);
    }
}
