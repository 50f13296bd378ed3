// src/dag/scheduler.rs

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::dag::graph::DependencyGraph;
use crate::dag::record::RunRecord;
use crate::exec::Launcher;
use petgraph::graph::NodeIndex;

/// Default pause between two walks of the graph.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    /// Pause between ticks. Bounds how late a finished job is noticed.
    pub poll_interval: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Gating decision for a pending job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    /// Some predecessor is not terminal yet.
    Wait,
    /// A required predecessor did not succeed; the job can never run.
    Starve,
    /// All predecessors are terminal and the success requirement holds.
    Ready,
}

/// Drives a [`DependencyGraph`] to completion by periodic polling.
///
/// Each [`tick`](Scheduler::tick) walks the graph from the root:
/// - terminal jobs are descended through,
/// - running jobs keep the tick incomplete,
/// - pending jobs are gated on their predecessors and then started, left
///   waiting, or starved together with all their descendants.
///
/// Single-threaded: exactly one walk is in flight at a time. Jobs run
/// concurrently only as OS processes.
#[derive(Debug)]
pub struct Scheduler<L: Launcher> {
    graph: DependencyGraph,
    launcher: L,
    options: SchedulerOptions,
    ticks: u64,
}

impl<L: Launcher> Scheduler<L> {
    pub fn new(graph: DependencyGraph, launcher: L, options: SchedulerOptions) -> Self {
        Self {
            graph,
            launcher,
            options,
            ticks: 0,
        }
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Number of ticks performed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Records of every job that has reached a terminal state, in graph order.
    pub fn records(&self) -> Vec<RunRecord> {
        self.graph
            .jobs()
            .filter_map(|job| job.record().cloned())
            .collect()
    }

    /// Run until every job is terminal, sleeping `poll_interval` between
    /// ticks, and return the records of all jobs.
    ///
    /// Per-job failures never stop the loop. Whether the run as a whole
    /// "passed" is for the caller to decide from the records.
    pub async fn run(&mut self) -> Vec<RunRecord> {
        info!(
            jobs = self.graph.len(),
            poll_interval = ?self.options.poll_interval,
            "scheduler started"
        );

        while !self.tick() {
            tokio::time::sleep(self.options.poll_interval).await;
        }

        info!(ticks = self.ticks, "all jobs terminal; run complete");
        self.records()
    }

    /// One walk of the graph from the root.
    ///
    /// Returns `true` once every reachable job is terminal. Each node is
    /// processed at most once per tick, so a job reachable through several
    /// parents is never started twice, and repeated ticks without external
    /// change have no further side effects.
    pub fn tick(&mut self) -> bool {
        self.ticks += 1;

        let mut complete = true;
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut stack = vec![self.graph.root()];

        while let Some(idx) = stack.pop() {
            if !visited.insert(idx) {
                continue;
            }

            if self.graph.node_mut(idx).is_terminal() {
                stack.extend(self.graph.successors(idx));
                continue;
            }

            if self.graph.node(idx).is_running() {
                complete = false;
                continue;
            }

            match self.gate(idx) {
                Gate::Wait => complete = false,
                Gate::Starve => {
                    // Nothing below this job can make progress any more; the
                    // branch counts as finished.
                    warn!(
                        job = %self.graph.node(idx).id(),
                        "required predecessor did not succeed; starving job and its descendants"
                    );
                    self.kill(idx);
                }
                Gate::Ready => {
                    complete = false;
                    let node = self.graph.node_mut(idx);
                    if let Err(err) = node.start(&self.launcher) {
                        error!(job = %node.id(), error = %err, "job could not be started");
                    }
                }
            }
        }

        debug!(tick = self.ticks, complete, "tick finished");
        complete
    }

    /// Evaluate gating for a pending job over all of its predecessors.
    fn gate(&mut self, idx: NodeIndex) -> Gate {
        let requires_success = self.graph.node(idx).spec().requires_parent_success;

        let mut all_succeeded = true;
        for parent in self.graph.predecessors(idx) {
            let parent = self.graph.node_mut(parent);
            if !parent.is_terminal() {
                return Gate::Wait;
            }
            all_succeeded &= parent.succeeded();
        }

        if requires_success && !all_succeeded {
            Gate::Starve
        } else {
            Gate::Ready
        }
    }

    /// Starve `idx` and, unconditionally, every descendant.
    ///
    /// Descendants are starved regardless of their own
    /// `requires_parent_success`: an ancestor that never ran is treated like
    /// one that failed.
    fn kill(&mut self, idx: NodeIndex) {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut stack = vec![idx];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }

            let node = self.graph.node_mut(current);
            if let Err(err) = node.mark_starved() {
                // Unreachable while gating holds: nothing below a pending job
                // can already be running.
                warn!(job = %node.id(), error = %err, "cannot starve job; leaving it untouched");
            } else {
                debug!(job = %node.id(), state = ?node.state(), "starvation applied");
            }

            stack.extend(self.graph.successors(current));
        }
    }
}
