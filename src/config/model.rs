// src/config/model.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::dag::JobSpec;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [workflow]
/// name = "nightly"
/// poll_interval = "5s"
///
/// [defaults]
/// env = { STAGE = "prod" }
///
/// [job.extract]
/// script = "python extract.py --full"
///
/// [job.load]
/// script = ["python", "load.py"]
/// depends_on = "extract"
/// ```
///
/// This is the unvalidated shape; see [`ConfigFile`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub workflow: WorkflowSection,

    #[serde(default)]
    pub defaults: DefaultsSection,

    /// All jobs from `[job.<id>]`. Keys are the job ids.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,
}

/// `[workflow]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WorkflowSection {
    /// Workflow name; names the log directory and pid file. Defaults to the
    /// config file stem.
    #[serde(default)]
    pub name: Option<String>,

    /// Pause between scheduler ticks, e.g. `"500ms"`, `"5s"`.
    #[serde(default)]
    pub poll_interval: Option<String>,

    /// Root of the log tree. Relative paths are resolved against the config
    /// file's directory. Defaults to `<config dir>/log`.
    #[serde(default)]
    pub log_root: Option<PathBuf>,
}

/// `[defaults]` section, applied to every job.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultsSection {
    #[serde(default)]
    pub homedir: Option<PathBuf>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// A value that may be written either as a single string or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s.clone()],
            OneOrMany::Many(v) => v.clone(),
        }
    }
}

/// Job command: a shell-like line (split with shell quoting rules, but *not*
/// run through a shell) or an explicit argv.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Script {
    Line(String),
    Argv(Vec<String>),
}

impl Script {
    /// Split into argv. `None` if the line has unbalanced quotes.
    pub fn argv(&self) -> Option<Vec<String>> {
        match self {
            Script::Line(line) => shlex::split(line),
            Script::Argv(argv) => Some(argv.clone()),
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Script::Line(line) => f.write_str(line),
            Script::Argv(argv) => write!(f, "{:?}", argv),
        }
    }
}

/// `[job.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub script: Script,

    /// Jobs this one waits for. A single string is shorthand for a
    /// one-element list; absent means "depends only on the root".
    #[serde(default)]
    pub depends_on: Option<OneOrMany>,

    /// Whether every dependency must have *succeeded* (default) or merely
    /// finished.
    #[serde(default = "default_requires_parent_success")]
    pub requires_parent_success: bool,

    /// Working directory; relative paths are resolved against the config
    /// file's directory.
    #[serde(default)]
    pub homedir: Option<PathBuf>,

    /// Merged over `[defaults].env`, which is merged over the inherited
    /// environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_requires_parent_success() -> bool {
    true
}

impl JobConfig {
    pub fn dependencies(&self) -> Vec<String> {
        self.depends_on
            .as_ref()
            .map(OneOrMany::to_vec)
            .unwrap_or_default()
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holding one means
/// dependencies are known, the DAG is acyclic and every script parses.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub workflow: WorkflowSection,
    pub defaults: DefaultsSection,
    pub job: BTreeMap<String, JobConfig>,
    poll_interval: Duration,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        workflow: WorkflowSection,
        defaults: DefaultsSection,
        job: BTreeMap<String, JobConfig>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            workflow,
            defaults,
            job,
            poll_interval,
        }
    }

    /// Parsed `[workflow].poll_interval` (or the default).
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Workflow name, falling back to `fallback` (usually the config stem).
    pub fn name_or(&self, fallback: &str) -> String {
        self.workflow
            .name
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Effective log root.
    pub fn log_root(&self, config_dir: &Path) -> PathBuf {
        match &self.workflow.log_root {
            Some(p) => resolve(config_dir, p),
            None => config_dir.join("log"),
        }
    }

    /// Resolve every job into the normalized form consumed by the scheduler.
    ///
    /// - `depends_on` always becomes a list,
    /// - `script` becomes argv,
    /// - `homedir` falls back to `[defaults].homedir`, then to `config_dir`,
    /// - `env` is `[defaults].env` overlaid with the job's own `env`.
    pub fn job_specs(&self, config_dir: &Path) -> Vec<JobSpec> {
        self.job
            .iter()
            .map(|(id, job)| {
                let homedir = job
                    .homedir
                    .as_ref()
                    .or(self.defaults.homedir.as_ref())
                    .map(|p| resolve(config_dir, p))
                    .unwrap_or_else(|| config_dir.to_path_buf());

                let mut env = self.defaults.env.clone();
                env.extend(job.env.iter().map(|(k, v)| (k.clone(), v.clone())));

                JobSpec {
                    id: id.clone(),
                    // Validated as parseable; an empty argv is rejected by the
                    // graph builder.
                    command: job.script.argv().unwrap_or_default(),
                    depends_on: job.dependencies(),
                    requires_parent_success: job.requires_parent_success,
                    homedir: Some(homedir),
                    env,
                }
            })
            .collect()
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
