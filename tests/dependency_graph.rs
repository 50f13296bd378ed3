// tests/dependency_graph.rs

mod common;
use crate::common::builders::JobSpecBuilder;

use std::collections::HashSet;

use dagrun::dag::{DependencyGraph, JobSpec, NodeIndex, ROOT_ID};
use dagrun::errors::DagrunError;
use dagrun::types::JobState;

fn ids(graph: &DependencyGraph, nodes: Vec<NodeIndex>) -> HashSet<String> {
    nodes
        .into_iter()
        .map(|idx| graph.node(idx).id().to_string())
        .collect()
}

fn set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn jobs_without_dependencies_hang_off_the_root() {
    let dir = tempfile::tempdir().unwrap();
    let graph = DependencyGraph::build(
        vec![
            JobSpecBuilder::new("A").build(),
            JobSpecBuilder::new("B").build(),
            JobSpecBuilder::new("C").after("A").after("B").build(),
        ],
        dir.path(),
    )
    .unwrap();

    assert_eq!(graph.len(), 3);

    let root = graph.root();
    assert_eq!(graph.node(root).id(), ROOT_ID);
    assert_eq!(graph.node(root).state(), JobState::Succeeded);
    assert!(graph.predecessors(root).is_empty());
    assert_eq!(ids(&graph, graph.successors(root)), set(&["A", "B"]));

    let c = graph.find("C").unwrap();
    assert_eq!(ids(&graph, graph.predecessors(c)), set(&["A", "B"]));
    assert!(graph.successors(c).is_empty());

    let a = graph.find("A").unwrap();
    assert_eq!(ids(&graph, graph.predecessors(a)), set(&[ROOT_ID]));
    assert_eq!(ids(&graph, graph.successors(a)), set(&["C"]));
}

#[test]
fn jobs_iterate_in_given_order_without_root() {
    let dir = tempfile::tempdir().unwrap();
    let graph = DependencyGraph::build(
        vec![
            JobSpecBuilder::new("z").build(),
            JobSpecBuilder::new("a").after("z").build(),
            JobSpecBuilder::new("m").build(),
        ],
        dir.path(),
    )
    .unwrap();

    let order: Vec<&str> = graph.jobs().map(|j| j.id()).collect();
    assert_eq!(order, vec!["z", "a", "m"]);
    assert!(graph.jobs().all(|j| j.state() == JobState::Pending));
}

#[test]
fn repeated_dependencies_collapse_to_one_edge() {
    let dir = tempfile::tempdir().unwrap();
    let graph = DependencyGraph::build(
        vec![
            JobSpecBuilder::new("A").build(),
            JobSpecBuilder::new("B").after("A").after("A").build(),
        ],
        dir.path(),
    )
    .unwrap();

    let b = graph.find("B").unwrap();
    assert_eq!(graph.predecessors(b).len(), 1);
}

#[test]
fn log_paths_are_named_after_job_id() {
    let dir = tempfile::tempdir().unwrap();
    let graph =
        DependencyGraph::build(vec![JobSpecBuilder::new("extract").build()], dir.path()).unwrap();

    let paths = graph.job("extract").unwrap().log_paths();
    assert_eq!(paths.out, dir.path().join("extract.out"));
    assert_eq!(paths.err, dir.path().join("extract.err"));
    assert_eq!(paths.stat, dir.path().join("extract.stat"));

    // Nothing is created before the job starts or starves.
    assert!(!paths.out.exists());
}

fn build_err(specs: Vec<JobSpec>) -> DagrunError {
    let dir = tempfile::tempdir().unwrap();
    DependencyGraph::build(specs, dir.path()).expect_err("build should fail")
}

#[test]
fn unknown_dependency_is_rejected() {
    let err = build_err(vec![JobSpecBuilder::new("A").after("missing").build()]);
    match err {
        DagrunError::UnknownDependency { job, dependency } => {
            assert_eq!(job, "A");
            assert_eq!(dependency, "missing");
        }
        other => panic!("expected UnknownDependency, got {other:?}"),
    }
}

#[test]
fn cycle_is_rejected() {
    let err = build_err(vec![
        JobSpecBuilder::new("A").after("C").build(),
        JobSpecBuilder::new("B").after("A").build(),
        JobSpecBuilder::new("C").after("B").build(),
    ]);
    match err {
        DagrunError::DagCycle(msg) => assert!(msg.contains("cycle detected")),
        other => panic!("expected DagCycle, got {other:?}"),
    }
}

#[test]
fn self_dependency_is_a_cycle() {
    let err = build_err(vec![JobSpecBuilder::new("A").after("A").build()]);
    assert!(matches!(err, DagrunError::DagCycle(_)), "got {err:?}");
}

#[test]
fn duplicate_job_id_is_rejected() {
    let err = build_err(vec![
        JobSpecBuilder::new("A").build(),
        JobSpecBuilder::new("A").build(),
    ]);
    assert!(matches!(err, DagrunError::DuplicateJob(ref id) if id == "A"), "got {err:?}");
}

#[test]
fn root_id_is_reserved() {
    let err = build_err(vec![JobSpecBuilder::new(ROOT_ID).build()]);
    assert!(matches!(err, DagrunError::ReservedJobId(_)), "got {err:?}");
}

#[test]
fn empty_command_is_rejected() {
    let err = build_err(vec![JobSpecBuilder::new("A").command(&[]).build()]);
    assert!(matches!(err, DagrunError::EmptyCommand(ref id) if id == "A"), "got {err:?}");
}

#[test]
fn empty_job_list_builds_root_only() {
    let dir = tempfile::tempdir().unwrap();
    let graph = DependencyGraph::build(Vec::new(), dir.path()).unwrap();
    assert!(graph.is_empty());
    assert_eq!(graph.jobs().count(), 0);
}
