// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod rundir;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, config_dir, load_and_validate, validate_workflow_name};
use crate::dag::{DependencyGraph, RunRecord, Scheduler, SchedulerOptions};
use crate::exec::TokioLauncher;
use crate::rundir::{PidLock, RunDir};
use crate::types::Outcome;

/// Per-outcome tally of a finished run, plus the records it was derived from.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub records: Vec<RunRecord>,
    pub succeeded: usize,
    pub failed: usize,
    pub starved: usize,
}

impl RunSummary {
    pub fn from_records(records: Vec<RunRecord>) -> Self {
        let count = |outcome: Outcome| records.iter().filter(|r| r.outcome == outcome).count();
        Self {
            succeeded: count(Outcome::Succeeded),
            failed: count(Outcome::Failed),
            starved: count(Outcome::Starved),
            records,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.starved == 0
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - the pid lock and per-run log directory
/// - graph construction
/// - the scheduler, driving real processes until every job is terminal
pub async fn run(args: CliArgs) -> Result<RunSummary> {
    let config_path = args.config.clone();
    let cfg = load_and_validate(&config_path)?;
    let base_dir = config_dir(&config_path);

    let name = match args.name.clone() {
        Some(name) => {
            validate_workflow_name(&name)?;
            name
        }
        None => cfg.name_or(&config_stem(&config_path)),
    };

    if args.dry_run {
        print_dry_run(&cfg, &name, &base_dir);
        return Ok(RunSummary::default());
    }

    let log_root = args
        .log_root
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| cfg.log_root(&base_dir));
    let poll_interval = args.poll_interval.unwrap_or_else(|| cfg.poll_interval());

    let _lock = PidLock::acquire(PidLock::path_for(&log_root, &name))?;
    let run_dir = RunDir::create(&log_root, &name)?;

    info!(
        workflow = %name,
        log_dir = %run_dir.path().display(),
        "starting workflow run"
    );

    let graph = DependencyGraph::build(cfg.job_specs(&base_dir), run_dir.path())?;
    let options = SchedulerOptions { poll_interval };
    let mut scheduler = Scheduler::new(graph, TokioLauncher::new(), options);

    let summary = RunSummary::from_records(scheduler.run().await);

    if summary.all_succeeded() {
        info!(workflow = %name, succeeded = summary.succeeded, "workflow run finished");
    } else {
        warn!(
            workflow = %name,
            succeeded = summary.succeeded,
            failed = summary.failed,
            starved = summary.starved,
            "workflow run finished with failures"
        );
    }

    Ok(summary)
}

/// Config file stem, used as the workflow name when none is configured.
fn config_stem(config_path: &Path) -> String {
    config_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "default".to_string())
}

/// Simple dry-run output: print jobs, deps and commands.
fn print_dry_run(cfg: &ConfigFile, name: &str, base_dir: &Path) {
    println!("dagrun dry-run");
    println!("  workflow.name = {name}");
    println!("  workflow.poll_interval = {:?}", cfg.poll_interval());
    println!("  workflow.log_root = {}", cfg.log_root(base_dir).display());
    println!();

    println!("jobs ({}):", cfg.job.len());
    for spec in cfg.job_specs(base_dir) {
        println!("  - {}", spec.id);
        println!("      command: {:?}", spec.command);
        if !spec.depends_on.is_empty() {
            println!("      depends_on: {:?}", spec.depends_on);
        }
        if !spec.requires_parent_success {
            println!("      requires_parent_success: false");
        }
        if let Some(ref dir) = spec.homedir {
            println!("      homedir: {}", dir.display());
        }
        if !spec.env.is_empty() {
            println!("      env: {:?}", spec.env);
        }
    }

    debug!("dry-run complete (no execution)");
}
