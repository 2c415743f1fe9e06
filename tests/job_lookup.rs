//! Job Lookup Tests
//!
//! End-to-end lookup path over mock nodes: fleet → selection → get_job →
//! rendering, with the exact stdout contract of `storagectl storage job`.

use std::cell::Cell;
use std::sync::Arc;

use serde_json::json;
use storage_ctl::mock::FailureConfig;
use storage_ctl::{
    ClientFleet, ErrorCode, FleetError, JobQuery, LookupError, MockNode, MockTransport, NodeClient,
};

/// Helper: a fleet of node clients, one per mock node, in order
fn fleet_of(nodes: &[MockNode]) -> Result<ClientFleet<NodeClient>, FleetError> {
    let clients = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            NodeClient::new(format!("mock-{}", i), Arc::new(MockTransport::with_node(node.clone())))
        })
        .collect();
    ClientFleet::new(clients)
}

fn run_lookup(nodes: &[MockNode], job_id: Option<&str>) -> (String, Result<(), LookupError>) {
    let query = JobQuery::new(|| fleet_of(nodes));
    let mut out = Vec::new();
    let result = query.run(job_id, &mut out);
    (String::from_utf8(out).unwrap(), result)
}

// =============================================================================
// Successful lookups
// =============================================================================

#[test]
fn test_record_rendered_with_two_space_indent() {
    let node = MockNode::new();
    node.insert_job("j1", json!({"id": "j1", "state": "RUNNING", "attempts": 2}));

    let (out, result) = run_lookup(&[node], Some("j1"));

    assert!(result.is_ok());
    assert_eq!(
        out,
        "{\n  \"id\": \"j1\",\n  \"state\": \"RUNNING\",\n  \"attempts\": 2\n}\n"
    );
}

#[test]
fn test_record_field_order_survives_the_wire() {
    let node = MockNode::new();
    let record: serde_json::Value =
        serde_json::from_str(r#"{"updated_at":"2026-01-02","state":"DONE","id":"j7"}"#).unwrap();
    node.insert_job("j7", record);

    let (out, _) = run_lookup(&[node], Some("j7"));

    let updated = out.find("updated_at").unwrap();
    let state = out.find("state").unwrap();
    let id = out.find("\"id\"").unwrap();
    assert!(updated < state && state < id, "keys reordered: {}", out);
}

#[test]
fn test_created_job_renders_with_node_fields() {
    let node = MockNode::new();
    node.create_job("j3", "QUEUED");

    let (out, result) = run_lookup(&[node], Some("j3"));

    assert!(result.is_ok());
    assert!(out.starts_with("{\n  \"id\": \"j3\",\n  \"state\": \"QUEUED\",\n  \"attempts\": 0,\n  \"created_at\": "));
}

#[test]
fn test_rendering_is_idempotent() {
    let node = MockNode::new();
    node.insert_job("j2", json!({"id": "j2", "shards": [{"n": 1}, {"n": 2}], "meta": {"k": null}}));

    let (first, _) = run_lookup(&[node.clone()], Some("j2"));
    let (second, _) = run_lookup(&[node], Some("j2"));

    assert_eq!(first, second);
    assert!(first.ends_with("}\n"));
}

// =============================================================================
// Selection: only the first node is ever queried
// =============================================================================

#[test]
fn test_only_first_node_queried() {
    for fleet_len in 1..=4 {
        let nodes: Vec<MockNode> = (0..fleet_len).map(|_| MockNode::new()).collect();
        for node in &nodes {
            node.insert_job("j1", json!({"id": "j1"}));
        }

        let (_, result) = run_lookup(&nodes, Some("j1"));
        assert!(result.is_ok());

        assert_eq!(nodes[0].request_count(), 1);
        for node in &nodes[1..] {
            assert_eq!(node.request_count(), 0, "fleet of {} queried a non-first node", fleet_len);
        }
    }
}

#[test]
fn test_no_fallback_when_first_node_fails() {
    let first = MockNode::new();
    first.inject_failure("get_job", FailureConfig::error(ErrorCode::Busy, "overloaded"));
    let second = MockNode::new();
    second.insert_job("j1", json!({"id": "j1"}));

    let (out, result) = run_lookup(&[first.clone(), second.clone()], Some("j1"));

    assert!(out.starts_with("getting job error, "));
    assert!(matches!(result, Err(LookupError::QueryFailed { .. })));
    assert_eq!(first.request_count(), 1);
    assert_eq!(second.request_count(), 0);
}

// =============================================================================
// Failure paths
// =============================================================================

#[test]
fn test_empty_fleet_prints_no_clients_and_skips_query() {
    let (out, result) = run_lookup(&[], Some("j1"));

    assert_eq!(out, "Couldn't find any clients\n");
    assert!(matches!(result, Err(LookupError::FleetUnavailable(FleetError::Empty))));
}

#[test]
fn test_job_not_found_diagnostic_is_one_line() {
    let node = MockNode::new();

    let (out, result) = run_lookup(&[node], Some("missing"));

    assert_eq!(out, "getting job error, Job not found: missing\n");
    assert_eq!(out.lines().count(), 1);
    assert!(!out.contains('{'), "no rendering should be attempted");
    assert!(matches!(result, Err(LookupError::QueryFailed { .. })));
}

#[test]
fn test_query_is_not_retried() {
    let node = MockNode::new();
    node.insert_job("j1", json!({"id": "j1"}));
    node.inject_failure(
        "get_job",
        FailureConfig::error(ErrorCode::Internal, "transient").with_fail_count(1),
    );

    let (out, result) = run_lookup(&[node.clone()], Some("j1"));

    assert_eq!(out, "getting job error, Node error: INTERNAL: transient\n");
    assert!(result.is_err());
    assert_eq!(node.request_count(), 1);
}

#[test]
fn test_multi_line_node_error_stays_on_one_line() {
    let node = MockNode::new();
    node.inject_failure(
        "get_job",
        FailureConfig::error(ErrorCode::Busy, "ssh: Warning: added host\nPermission denied"),
    );

    let (out, result) = run_lookup(&[node], Some("j1"));

    assert_eq!(out, "getting job error, Node busy: ssh: Warning: added host; Permission denied\n");
    assert_eq!(out.lines().count(), 1);
    assert!(matches!(result, Err(LookupError::QueryFailed { .. })));
}

#[test]
fn test_missing_job_id_skips_fleet_initialization() {
    let initialized = Cell::new(false);
    let query = JobQuery::new(|| {
        initialized.set(true);
        fleet_of(&[MockNode::new()])
    });

    let mut out = Vec::new();
    let result = query.run(None, &mut out);

    assert!(out.is_empty());
    assert!(!initialized.get());
    assert!(matches!(result, Err(LookupError::MissingArgument)));
    assert_eq!(result.unwrap_err().exit_code(), 0);
}

#[test]
fn test_any_job_id_is_passed_through_unvalidated() {
    let node = MockNode::new();
    node.insert_job("  weird/ID?#", json!({"id": "  weird/ID?#"}));

    let (out, result) = run_lookup(&[node], Some("  weird/ID?#"));

    assert!(result.is_ok());
    assert!(out.contains("weird/ID?#"));
}
