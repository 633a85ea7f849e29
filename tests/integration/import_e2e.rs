//! End-to-end import: parse, create, link.

use beadplan::config::{Config, Defaults};
use beadplan::parser::parse_document;
use beadplan::pipeline::{CreationOutcome, DependencyApplier, EdgeSource, TaskCreator};
use beadplan::{DependencyTable, ExternalId, IdMap};

use crate::fixtures::{id, RecordingTracker, SAMPLE_PLAN};

const ROOT_CHILD: &str = "\
### Task: Root
**ID:** root

### Task: Child
**ID:** child
**Description:**
Do X
**Deliverables:**
Y
**Acceptance Criteria:**
Z
";

#[test]
fn test_root_child_scenario() {
    let parsed = parse_document(ROOT_CHILD);
    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.records[0].dependencies, None);

    let creator = TaskCreator::new(Defaults::default());
    let mut tracker = RecordingTracker::with_ids(&["A0", "A1"]);
    let mut map = IdMap::new();
    let report = creator.create_all(&parsed.records, &mut tracker, &mut map);

    assert_eq!(report.created(), 2);
    assert_eq!(map.get(&id("root")), Some(&ExternalId::new("A0")));
    assert_eq!(map.get(&id("child")), Some(&ExternalId::new("A1")));

    let child_body = &tracker.creations()[1].body;
    assert_eq!(
        child_body,
        "Do X\n\nDELIVERABLES:\nY\n\nACCEPTANCE CRITERIA:\nZ\n\nTask ID: child"
    );

    let mut edges = DependencyTable::new();
    edges.add(id("child"), id("root"));
    let applied = DependencyApplier::apply(&edges, &mut tracker, &map);

    assert_eq!(applied.applied(), 1);
    assert_eq!(
        tracker.dependencies(),
        vec![("A1".to_string(), "A0".to_string())]
    );
}

#[test]
fn test_sample_plan_with_derived_edges() {
    let parsed = parse_document(SAMPLE_PLAN);
    let creator = TaskCreator::new(Defaults::default());
    let mut tracker = RecordingTracker::with_ids(&["b-11", "b-12", "b-21", "b-22"]);
    let mut map = IdMap::new();

    creator.create_all(&parsed.records, &mut tracker, &mut map);
    let edges = EdgeSource::Auto.select(&DependencyTable::new(), &parsed.records);
    let report = DependencyApplier::apply(&edges, &mut tracker, &map);

    assert_eq!(report.attempted(), 4);
    assert_eq!(report.applied(), 4);
    assert_eq!(
        tracker.dependencies(),
        vec![
            ("b-12".to_string(), "b-11".to_string()),
            ("b-21".to_string(), "b-11".to_string()),
            ("b-21".to_string(), "b-12".to_string()),
            ("b-22".to_string(), "b-21".to_string()),
        ]
    );
}

#[test]
fn test_creation_requests_carry_defaults_and_labels() {
    let parsed = parse_document(SAMPLE_PLAN);
    let creator = TaskCreator::new(Defaults {
        task_type: None,
        priority: Some("P3".to_string()),
    });
    let mut tracker = RecordingTracker::new();
    let mut map = IdMap::new();

    creator.create_all(&parsed.records, &mut tracker, &mut map);
    let requests = tracker.creations();

    assert_eq!(requests.len(), 4);
    assert_eq!(requests[0].labels, vec!["setup", "infra", "hel.1.1"]);
    assert_eq!(requests[0].estimate, Some(30));
    assert_eq!(requests[1].task_type, "task");
    assert_eq!(requests[1].priority, "P2");
    assert_eq!(requests[2].task_type, "feature");
    assert_eq!(requests[2].priority, "P3");
    assert_eq!(requests[3].labels, vec!["hel.2.2"]);
    assert_eq!(requests[3].estimate, None);
}

#[test]
fn test_failed_creation_leaves_edges_unmapped() {
    let parsed = parse_document(SAMPLE_PLAN);
    let creator = TaskCreator::new(Defaults::default());
    let mut tracker = RecordingTracker::new().failing_title("Config loader");
    let mut map = IdMap::new();

    let created = creator.create_all(&parsed.records, &mut tracker, &mut map);
    assert_eq!(created.created(), 3);
    assert_eq!(created.failed(), 1);
    assert!(matches!(created.outcomes[1].1, CreationOutcome::Failed(_)));
    assert!(!map.contains(&id("hel.1.2")));

    let edges = DependencyTable::from_records(&parsed.records);
    let report = DependencyApplier::apply(&edges, &mut tracker, &map);

    // hel.1.2 -> hel.1.1 and hel.2.1 -> hel.1.2 lose an endpoint.
    assert_eq!(report.attempted(), 4);
    assert_eq!(report.applied(), 2);
    assert_eq!(tracker.dependencies().len(), 2);
}

#[test]
fn test_seeded_epic_is_not_recreated() {
    let config: Config = toml::from_str(
        r#"
[seed]
"hel.0" = "uur-1-5-97e"

[dependencies]
"hel.1.1" = ["hel.0"]
"#,
    )
    .unwrap();
    let plan = format!("### Task: Epic\n**ID:** hel.0\n\n{}", SAMPLE_PLAN);
    let parsed = parse_document(&plan);

    let creator = TaskCreator::new(config.defaults.clone());
    let mut tracker = RecordingTracker::new();
    let mut map = config.seeded_map().unwrap();

    let created = creator.create_all(&parsed.records, &mut tracker, &mut map);
    assert_eq!(created.already_mapped(), 1);
    assert_eq!(created.created(), 4);
    assert!(tracker.creations().iter().all(|r| r.title != "Epic"));

    let edges = EdgeSource::Auto.select(&config.dependencies, &parsed.records);
    DependencyApplier::apply(&edges, &mut tracker, &map);
    assert_eq!(
        tracker.dependencies(),
        vec![("T1".to_string(), "uur-1-5-97e".to_string())]
    );
}

#[test]
fn test_document_edges_use_declared_ids_only() {
    let plan = ROOT_CHILD.replace(
        "**ID:** child\n",
        "**ID:** child\n**Dependencies:** root, not API v1.2 or root.1a\n",
    );
    let parsed = parse_document(&plan);
    let creator = TaskCreator::new(Defaults::default());
    let mut tracker = RecordingTracker::with_ids(&["A0", "A1"]);
    let mut map = IdMap::new();

    creator.create_all(&parsed.records, &mut tracker, &mut map);
    let edges = EdgeSource::Auto.select_known(&DependencyTable::new(), &parsed.records, &map);
    let report = DependencyApplier::apply(&edges, &mut tracker, &map);

    assert_eq!(report.attempted(), 1);
    assert_eq!(report.failed(), 0);
    assert_eq!(
        tracker.dependencies(),
        vec![("A1".to_string(), "A0".to_string())]
    );
}
