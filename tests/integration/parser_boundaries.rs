//! Field boundary tests on realistic plan documents.

use beadplan::parser::parse_document;

use crate::fixtures::{id, SAMPLE_PLAN};

#[test]
fn test_sample_plan_records_and_drops() {
    let parsed = parse_document(SAMPLE_PLAN);

    let ids: Vec<&str> = parsed.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["hel.1.1", "hel.1.2", "hel.2.1", "hel.2.2"]);
    assert_eq!(parsed.dropped, 1);
    assert_eq!(parsed.block_count(), 5);
}

#[test]
fn test_sample_plan_full_record() {
    let parsed = parse_document(SAMPLE_PLAN);
    let scaffold = &parsed.records[0];

    assert_eq!(scaffold.id, id("hel.1.1"));
    assert_eq!(scaffold.title, "Project scaffold");
    assert_eq!(scaffold.task_type.as_deref(), Some("task"));
    assert_eq!(scaffold.priority.as_deref(), Some("P1"));
    assert_eq!(scaffold.estimate, Some(30));
    assert_eq!(scaffold.labels, vec!["setup", "infra"]);
    assert_eq!(scaffold.dependencies.as_deref(), Some("None"));
    assert_eq!(
        scaffold.description.as_deref(),
        Some("Create the workspace layout.\n\nInclude CI configuration.")
    );
    assert_eq!(
        scaffold.deliverables.as_deref(),
        Some("- Cargo workspace\n- CI pipeline")
    );
    assert_eq!(
        scaffold.acceptance.as_deref(),
        Some("- [ ] `cargo build` succeeds")
    );
}

#[test]
fn test_description_directly_followed_by_label() {
    let parsed = parse_document(SAMPLE_PLAN);
    let config = &parsed.records[1];

    assert_eq!(config.description.as_deref(), Some("Load TOML configuration."));
    assert_eq!(config.deliverables.as_deref(), Some("- config.rs"));
    assert_eq!(config.task_type, None);
}

#[test]
fn test_phase_heading_after_rule_is_not_content() {
    let parsed = parse_document(SAMPLE_PLAN);
    let config = &parsed.records[1];

    let acceptance = config.acceptance.as_deref().unwrap_or_default();
    assert_eq!(acceptance, "- [ ] defaults apply");
    assert!(!acceptance.contains("Phase 2"));
}

#[test]
fn test_last_block_runs_to_end_of_text() {
    let parsed = parse_document(SAMPLE_PLAN);
    let applier = parsed.records.last().unwrap();

    assert_eq!(applier.id, id("hel.2.2"));
    assert_eq!(applier.acceptance.as_deref(), Some("- edges applied in order"));
    assert_eq!(applier.description, None);
}

#[test]
fn test_crlf_document() {
    let doc = SAMPLE_PLAN.replace('\n', "\r\n");
    let parsed = parse_document(&doc);

    assert_eq!(parsed.records.len(), 4);
    assert_eq!(
        parsed.records[0].description.as_deref(),
        Some("Create the workspace layout.\n\nInclude CI configuration.")
    );
}

#[test]
fn test_rendered_body_of_parsed_record() {
    let parsed = parse_document(SAMPLE_PLAN);
    let body = parsed.records[1].render_body();

    assert_eq!(
        body,
        "Load TOML configuration.\n\n\
         DELIVERABLES:\n- config.rs\n\n\
         ACCEPTANCE CRITERIA:\n- [ ] defaults apply\n\n\
         Dependencies: hel.1.1\n\n\
         Task ID: hel.1.2"
    );
}
