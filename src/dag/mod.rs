// src/dag/mod.rs

//! DAG representation and scheduling.
//!
//! - [`job`] holds the per-job state machine (`JobNode`) and its normalized
//!   input (`JobSpec`).
//! - [`graph`] holds the immutable dependency graph, anchored at a synthetic
//!   `start` root.
//! - [`scheduler`] walks the graph once per tick, launching ready jobs and
//!   starving the descendants of failed requirements.
//! - [`record`] is the per-job outcome written to `<id>.stat`.

pub mod graph;
pub mod job;
pub mod record;
pub mod scheduler;

pub use graph::DependencyGraph;
pub use job::{JobNode, JobSpec, LogPaths, ROOT_ID};
pub use record::RunRecord;
pub use scheduler::{Scheduler, SchedulerOptions};

pub use petgraph::graph::NodeIndex;
