//! Dependency application against a recording tracker.

use beadplan::config::Defaults;
use beadplan::core::TableDrift;
use beadplan::parser::parse_document;
use beadplan::pipeline::{DependencyApplier, EdgeOutcome, TaskCreator};
use beadplan::{DependencyTable, ExternalId, IdMap};

use crate::fixtures::{id, RecordingTracker, TestWorkspace, SAMPLE_PLAN};

fn mapped(pairs: &[(&str, &str)]) -> IdMap {
    let mut map = IdMap::new();
    for (sym, ext) in pairs {
        map.insert(id(sym), ExternalId::new(*ext)).unwrap();
    }
    map
}

#[test]
fn test_unmapped_endpoint_skipped_and_run_continues() {
    let mut edges = DependencyTable::new();
    edges.add(id("hel.1.2"), id("hel.9.9"));
    edges.add(id("hel.2.1"), id("hel.1.1"));
    let map = mapped(&[("hel.1.1", "E11"), ("hel.1.2", "E12"), ("hel.2.1", "E21")]);
    let mut tracker = RecordingTracker::new();

    let report = DependencyApplier::apply(&edges, &mut tracker, &map);

    assert_eq!(report.attempted(), 2);
    assert_eq!(report.applied(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(
        report.outcomes[0].1,
        EdgeOutcome::Unmapped(vec![id("hel.9.9")])
    );
    // The skipped edge never reached the tracker.
    assert_eq!(
        tracker.dependencies(),
        vec![("E21".to_string(), "E11".to_string())]
    );
}

#[test]
fn test_tracker_failure_does_not_stop_later_edges() {
    let mut edges = DependencyTable::new();
    edges.add(id("a.2"), id("a.1"));
    edges.add(id("a.3"), id("a.1"));
    edges.add(id("a.3"), id("a.2"));
    let map = mapped(&[("a.1", "X1"), ("a.2", "X2"), ("a.3", "X3")]);
    let mut tracker = RecordingTracker::new().failing_dependent("X2");

    let report = DependencyApplier::apply(&edges, &mut tracker, &map);

    assert_eq!(report.attempted(), 3);
    assert_eq!(report.applied(), 2);
    assert!(matches!(report.outcomes[0].1, EdgeOutcome::Failed(_)));
    assert_eq!(tracker.dependencies().len(), 3);
}

#[test]
fn test_numeric_segment_order() {
    let mut edges = DependencyTable::new();
    edges.add(id("hel.10.1"), id("hel.9.4"));
    edges.add(id("hel.2.6"), id("hel.2.5"));
    edges.add(id("hel.2.6"), id("hel.2.2"));
    let map = mapped(&[
        ("hel.2.2", "c"),
        ("hel.2.5", "d"),
        ("hel.2.6", "e"),
        ("hel.9.4", "f"),
        ("hel.10.1", "g"),
    ]);
    let mut tracker = RecordingTracker::new();

    DependencyApplier::apply(&edges, &mut tracker, &map);

    assert_eq!(
        tracker.dependencies(),
        vec![
            ("e".to_string(), "d".to_string()),
            ("e".to_string(), "c".to_string()),
            ("g".to_string(), "f".to_string()),
        ]
    );
}

#[test]
fn test_staged_create_then_link_through_mapping_file() {
    let workspace = TestWorkspace::new();
    let map_path = workspace.path("mapping.json");
    let parsed = parse_document(SAMPLE_PLAN);

    // First invocation: create and save the mapping.
    {
        let creator = TaskCreator::new(Defaults::default());
        let mut tracker = RecordingTracker::with_ids(&["u-1", "u-2", "u-3", "u-4"]);
        let mut map = IdMap::new();
        creator.create_all(&parsed.records, &mut tracker, &mut map);
        map.save(&map_path).unwrap();
        assert!(tracker.dependencies().is_empty());
    }

    // Second invocation: load the mapping and link from an authored table.
    let config_path = workspace.write(
        "beadplan.toml",
        "[dependencies]\n\"hel.2.2\" = [\"hel.2.1\", \"hel.1.1\"]\n",
    );
    let config = beadplan::config::Config::load(Some(&config_path)).unwrap();
    let map = IdMap::load(&map_path).unwrap();
    let mut tracker = RecordingTracker::new();

    let report = DependencyApplier::apply(&config.dependencies, &mut tracker, &map);

    assert_eq!(report.applied(), 2);
    assert!(tracker.creations().is_empty());
    assert_eq!(
        tracker.dependencies(),
        vec![
            ("u-4".to_string(), "u-3".to_string()),
            ("u-4".to_string(), "u-1".to_string()),
        ]
    );
}

#[test]
fn test_drift_between_authored_table_and_document() {
    let parsed = parse_document(SAMPLE_PLAN);
    let derived = DependencyTable::from_records(&parsed.records);

    let mut authored = DependencyTable::new();
    authored.add(id("hel.1.2"), id("hel.1.1"));
    authored.add(id("hel.2.1"), id("hel.1.1"));
    authored.add(id("hel.2.1"), id("hel.1.2"));
    authored.add(id("hel.2.2"), id("hel.1.1"));

    let drift = TableDrift::between(&authored, &derived);

    let only_table: Vec<String> = drift.only_in_table.iter().map(ToString::to_string).collect();
    let only_doc: Vec<String> = drift
        .only_in_document
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(only_table, vec!["hel.2.2 -> hel.1.1"]);
    assert_eq!(only_doc, vec!["hel.2.2 -> hel.2.1"]);
}
