#![allow(dead_code)]

pub use dagrun_test_utils::{
    FAKE_TIMEOUT, PROCESS_TIMEOUT, builders, fake_launcher, init_tracing, with_timeout,
};

use std::path::Path;

use dagrun::dag::{DependencyGraph, JobSpec, Scheduler, SchedulerOptions};
use dagrun::exec::Launcher;
use dagrun::types::JobState;
use std::time::Duration;

/// Build a graph, panicking on construction errors.
pub fn graph(specs: Vec<JobSpec>, log_dir: &Path) -> DependencyGraph {
    DependencyGraph::build(specs, log_dir).expect("graph should build")
}

/// Scheduler with a short poll interval, suitable for `run().await` in tests.
pub fn scheduler<L: Launcher>(specs: Vec<JobSpec>, launcher: L, log_dir: &Path) -> Scheduler<L> {
    let options = SchedulerOptions {
        poll_interval: Duration::from_millis(10),
    };
    Scheduler::new(graph(specs, log_dir), launcher, options)
}

pub fn state_of<L: Launcher>(scheduler: &Scheduler<L>, id: &str) -> JobState {
    scheduler
        .graph()
        .job(id)
        .unwrap_or_else(|| panic!("unknown job {id}"))
        .state()
}

/// Tick until the graph is terminal; returns the number of ticks taken.
pub fn tick_until_done<L: Launcher>(scheduler: &mut Scheduler<L>, max_ticks: usize) -> usize {
    for n in 1..=max_ticks {
        if scheduler.tick() {
            return n;
        }
    }
    panic!("graph not terminal after {max_ticks} ticks");
}
