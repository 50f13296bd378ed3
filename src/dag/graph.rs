// src/dag/graph.rs

use std::collections::HashMap;
use std::path::Path;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::dag::job::{JobNode, JobSpec, ROOT_ID};
use crate::errors::{DagrunError, Result};
use crate::types::JobId;

/// Dependency DAG of jobs, stored as a petgraph arena keyed by `NodeIndex`.
///
/// Edge direction is parent -> child: for `depends_on = ["A"]` on job `B` we
/// add `A -> B`. Jobs without dependencies hang off the synthetic root
/// ([`ROOT_ID`]), which is already `Succeeded`, so every job is reachable
/// from it.
///
/// The edge set is fixed at [`DependencyGraph::build`]; only node state
/// changes during a run.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<JobNode, ()>,
    root: NodeIndex,
    index: HashMap<JobId, NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph from normalized job specs.
    ///
    /// Every job writes its `.out` / `.err` / `.stat` files into `log_dir`.
    ///
    /// Fails on duplicate ids, use of the reserved root id, empty commands,
    /// unknown dependencies and cycles (including self-dependencies). No
    /// process is spawned here.
    pub fn build(specs: Vec<JobSpec>, log_dir: &Path) -> Result<Self> {
        let mut graph: DiGraph<JobNode, ()> = DiGraph::new();
        let root = graph.add_node(JobNode::root(log_dir));
        let mut index: HashMap<JobId, NodeIndex> = HashMap::new();

        // First pass: one vertex per job.
        for spec in specs {
            if spec.id == ROOT_ID {
                return Err(DagrunError::ReservedJobId(spec.id));
            }
            if spec.command.is_empty() {
                return Err(DagrunError::EmptyCommand(spec.id));
            }
            if index.contains_key(&spec.id) {
                return Err(DagrunError::DuplicateJob(spec.id));
            }

            let id = spec.id.clone();
            let idx = graph.add_node(JobNode::new(spec, log_dir));
            index.insert(id, idx);
        }

        // Second pass: wire parent -> child edges.
        let jobs: Vec<NodeIndex> = graph.node_indices().filter(|&i| i != root).collect();
        for child in jobs {
            let deps = graph[child].spec().depends_on.clone();

            if deps.is_empty() {
                graph.update_edge(root, child, ());
                continue;
            }

            for dep in deps {
                let parent = match index.get(&dep) {
                    Some(&parent) => parent,
                    None => {
                        return Err(DagrunError::UnknownDependency {
                            job: graph[child].id().to_string(),
                            dependency: dep,
                        });
                    }
                };
                // `update_edge` collapses repeated entries in `depends_on`.
                graph.update_edge(parent, child, ());
            }
        }

        // A topological sort fails if there is a cycle.
        if let Err(cycle) = toposort(&graph, None) {
            return Err(DagrunError::DagCycle(format!(
                "cycle detected in job DAG involving job '{}'",
                graph[cycle.node_id()].id()
            )));
        }

        debug!(
            jobs = index.len(),
            edges = graph.edge_count(),
            "dependency graph built"
        );

        Ok(Self { graph, root, index })
    }

    /// The synthetic root vertex.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn node(&self, idx: NodeIndex) -> &JobNode {
        &self.graph[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut JobNode {
        &mut self.graph[idx]
    }

    /// Look up a job by id. The root is found under [`ROOT_ID`].
    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        if id == ROOT_ID {
            return Some(self.root);
        }
        self.index.get(id).copied()
    }

    /// Convenience: the job with the given id.
    pub fn job(&self, id: &str) -> Option<&JobNode> {
        self.find(id).map(|idx| self.node(idx))
    }

    /// All real jobs (the root excluded), in the order they were given.
    pub fn jobs(&self) -> impl Iterator<Item = &JobNode> {
        self.graph
            .node_indices()
            .filter(move |&i| i != self.root)
            .map(move |i| &self.graph[i])
    }

    /// Number of real jobs.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Direct children (jobs that depend on `idx`).
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect()
    }

    /// Direct parents (jobs `idx` depends on, or the root).
    pub fn predecessors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .collect()
    }
}
