// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::ROOT_ID;
use crate::dag::scheduler::DEFAULT_POLL_INTERVAL;
use crate::errors::{DagrunError, Result};
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DagrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        let poll_interval = match raw.workflow.poll_interval.as_deref() {
            Some(s) => parse_duration(s)?,
            None => DEFAULT_POLL_INTERVAL,
        };

        Ok(ConfigFile::new_unchecked(
            raw.workflow,
            raw.defaults,
            raw.job,
            poll_interval,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_workflow_section(cfg)?;
    validate_job_scripts(cfg)?;
    validate_job_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(DagrunError::ConfigError(
            "config must contain at least one [job.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_workflow_section(cfg: &RawConfigFile) -> Result<()> {
    if let Some(name) = &cfg.workflow.name {
        validate_workflow_name(name)?;
    }

    if let Some(interval) = &cfg.workflow.poll_interval {
        let parsed = parse_duration(interval)?;
        if parsed.is_zero() {
            return Err(DagrunError::ConfigError(
                "[workflow].poll_interval must be greater than zero".to_string(),
            ));
        }
    }

    Ok(())
}

/// A workflow name becomes a directory and a pid file name under the log
/// root, so it must be a single non-empty path component.
pub fn validate_workflow_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(DagrunError::ConfigError(format!(
            "workflow name must be a non-empty name without path separators (got '{}')",
            name
        )));
    }
    Ok(())
}

fn validate_job_scripts(cfg: &RawConfigFile) -> Result<()> {
    for (id, job) in cfg.job.iter() {
        match job.script.argv() {
            None => {
                return Err(DagrunError::ConfigError(format!(
                    "job '{}' has an unparseable script (unbalanced quotes?)",
                    id
                )));
            }
            Some(argv) if argv.is_empty() => {
                return Err(DagrunError::EmptyCommand(id.clone()));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn validate_job_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (id, job) in cfg.job.iter() {
        if id == ROOT_ID {
            return Err(DagrunError::ReservedJobId(id.clone()));
        }
        for dep in job.dependencies() {
            if dep == *id {
                return Err(DagrunError::ConfigError(format!(
                    "job '{}' cannot depend on itself in `depends_on`",
                    id
                )));
            }
            if !cfg.job.contains_key(&dep) {
                return Err(DagrunError::UnknownDependency {
                    job: id.clone(),
                    dependency: dep,
                });
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> job. For
    //   [job.B]
    //   depends_on = ["A"]
    // we add edge A -> B.
    let deps: Vec<(&str, Vec<String>)> = cfg
        .job
        .iter()
        .map(|(id, job)| (id.as_str(), job.dependencies()))
        .collect();

    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for &(id, _) in deps.iter() {
        graph.add_node(id);
    }

    for (id, job_deps) in deps.iter() {
        for dep in job_deps {
            graph.add_edge(dep.as_str(), *id, ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(DagrunError::DagCycle(format!(
            "cycle detected in job DAG involving job '{}'",
            cycle.node_id()
        ))),
    }
}
