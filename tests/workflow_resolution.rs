//! Workflow documents from JSON through resolution and dependency queries.

use flowwrite::core::{AnyTextBlock, DependencyErrorKind, NodeDefinition, TextBlockList};
use flowwrite::{validate_workflow, DependencyGraph, Error, WorkflowDefinition};
use std::collections::HashSet;

const DOCUMENT: &str = r#"{
  "id": "wf-1",
  "name": "Article pipeline",
  "nodes": [
    ["research", {"id": "research", "name": "Research",
      "config": {"userPrompt": {"id": "p1", "blocks": [{"type": "text", "id": "t1", "content": "List facts about Rust."}]}}}],
    ["summary", {"id": "summary", "name": "Summary",
      "config": {"userPrompt": {"id": "p2", "blocks": [
        {"type": "text", "id": "t2", "content": "Summarize: "},
        {"type": "virtual", "id": "v1", "sourceNodeId": "research"}]}}}],
    ["title", {"id": "title", "name": "Title",
      "config": {"systemPrompt": {"id": "p3", "blocks": [{"type": "virtual", "id": "v2", "sourceNodeId": "summary"}]},
                 "userPrompt": {"id": "p4", "blocks": [{"type": "virtual", "id": "v3", "sourceNodeId": "research"}]}}}]
  ]
}"#;

#[test]
fn test_document_resolves_in_dependency_order() {
    let wf = WorkflowDefinition::from_json(DOCUMENT).unwrap();
    assert_eq!(wf.id(), "wf-1");
    assert_eq!(
        wf.resolve().unwrap().into_inner(),
        vec!["research", "summary", "title"]
    );

    let graph = DependencyGraph::new(&wf.nodes);
    assert_eq!(graph.dependencies("title"), ["summary", "research"]);
    assert_eq!(graph.dependents("research"), ["summary", "title"]);
    assert_eq!(graph.entry_points(), vec!["research"]);
    assert_eq!(
        graph.find_path("research", "title"),
        Some(vec!["research".to_string(), "title".to_string()])
    );

    let mut done = HashSet::new();
    assert!(!graph.can_execute("summary", &done));
    done.insert("research".to_string());
    assert!(graph.can_execute("summary", &done));
    assert!(validate_workflow(&wf).is_valid());
}

#[test]
fn test_node_map_serializes_as_ordered_pairs() {
    let wf = WorkflowDefinition::from_json(DOCUMENT).unwrap();
    let value: serde_json::Value = serde_json::from_str(&wf.to_json().unwrap()).unwrap();
    let keys: Vec<&str> = value["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| pair[0].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["research", "summary", "title"]);
    assert_eq!(WorkflowDefinition::from_json(&wf.to_json().unwrap()).unwrap(), wf);
}

#[test]
fn test_mismatched_entry_key_is_rejected() {
    let doc = r#"{"id": "w", "name": "bad", "nodes": [["a", {"id": "b", "name": "B"}]]}"#;
    let err = WorkflowDefinition::from_json(doc).unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn test_removing_a_source_reports_missing_dependency() {
    let wf = WorkflowDefinition::from_json(DOCUMENT).unwrap();
    let edited = wf.remove_node("research");

    let err = edited.resolve().unwrap_err();
    assert_eq!(err.kind, DependencyErrorKind::Missing);
    assert_eq!(err.node_ids, vec!["summary", "research"]);
    // The original value is untouched.
    assert!(wf.resolve().is_ok());
}

#[test]
fn test_feedback_edge_reports_cycle() {
    let wf = WorkflowDefinition::from_json(DOCUMENT).unwrap();
    let looped = wf.update_node("research", |n: &NodeDefinition| {
        n.map_config(|c| {
            c.with_user_prompt(TextBlockList::with_blocks(vec![AnyTextBlock::virtual_ref("title")]))
        })
    });

    let err = looped.resolve().unwrap_err();
    assert_eq!(err.kind, DependencyErrorKind::Cycle);
    let mut ids = err.node_ids.clone();
    ids.sort();
    assert_eq!(ids, vec!["research", "summary", "title"]);
    assert!(err.message.starts_with("Circular dependency detected involving nodes:"));

    let converted: Error = err.into();
    assert!(matches!(converted, Error::Dependency(_)));
}
