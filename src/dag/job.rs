// src/dag/job.rs

//! Single-job state machine.
//!
//! A [`JobNode`] moves `Pending -> Running -> Succeeded | Failed`, or
//! `Pending -> Starved` when a required ancestor did not succeed. Terminal
//! states are final. Completion is only ever discovered by
//! [`JobNode::is_terminal`], which polls the process without blocking.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::dag::record::RunRecord;
use crate::errors::{DagrunError, Result};
use crate::exec::{Launcher, ProcessExit, ProcessHandle};
use crate::types::{JobId, JobState, Outcome};

/// Id of the synthetic root vertex. Reserved; no real job may use it.
pub const ROOT_ID: &str = "start";

/// Normalized job description as consumed by the scheduling core.
///
/// Anything shape-dependent (scalar-or-list dependencies, command strings)
/// has already been resolved by the config layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub id: JobId,
    /// `command[0]` is the executable; the rest are its arguments.
    pub command: Vec<String>,
    pub depends_on: Vec<JobId>,
    /// If true, the job only runs when every predecessor succeeded. If false,
    /// it runs once every predecessor is terminal, whatever the outcome.
    pub requires_parent_success: bool,
    /// Working directory; inherited from the scheduler process when `None`.
    pub homedir: Option<PathBuf>,
    /// Applied over the inherited environment.
    pub env: BTreeMap<String, String>,
}

impl JobSpec {
    pub fn new(id: impl Into<JobId>, command: Vec<String>) -> Self {
        Self {
            id: id.into(),
            command,
            depends_on: Vec::new(),
            requires_parent_success: true,
            homedir: None,
            env: BTreeMap::new(),
        }
    }
}

/// The three log files owned by a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    pub out: PathBuf,
    pub err: PathBuf,
    pub stat: PathBuf,
}

impl LogPaths {
    pub fn for_job(log_dir: &Path, id: &str) -> Self {
        Self {
            out: log_dir.join(format!("{id}.out")),
            err: log_dir.join(format!("{id}.err")),
            stat: log_dir.join(format!("{id}.stat")),
        }
    }

    /// Create (truncating) all three files.
    fn create(&self) -> io::Result<(File, File, File)> {
        Ok((
            File::create(&self.out)?,
            File::create(&self.err)?,
            File::create(&self.stat)?,
        ))
    }
}

#[derive(Debug)]
pub struct JobNode {
    spec: JobSpec,
    logs: LogPaths,
    state: JobState,
    started_at: Option<DateTime<Local>>,
    ended_at: Option<DateTime<Local>>,
    exit_code: Option<i32>,
    pid: Option<u32>,
    /// Live process; `Some` only while `Running`.
    process: Option<Box<dyn ProcessHandle>>,
    /// Open `.stat` stream; taken exactly once when the record is written.
    stat: Option<File>,
    record: Option<RunRecord>,
}

impl JobNode {
    pub fn new(spec: JobSpec, log_dir: &Path) -> Self {
        let logs = LogPaths::for_job(log_dir, &spec.id);
        Self {
            spec,
            logs,
            state: JobState::Pending,
            started_at: None,
            ended_at: None,
            exit_code: None,
            pid: None,
            process: None,
            stat: None,
            record: None,
        }
    }

    /// The synthetic root: already done and succeeded, never launched, never
    /// writes a record.
    pub(crate) fn root(log_dir: &Path) -> Self {
        let mut node = Self::new(JobSpec::new(ROOT_ID, Vec::new()), log_dir);
        node.state = JobState::Succeeded;
        node
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    pub fn log_paths(&self) -> &LogPaths {
        &self.logs
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.state.outcome()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Local>> {
        self.ended_at
    }

    /// Outcome record, present once the job is terminal.
    pub fn record(&self) -> Option<&RunRecord> {
        self.record.as_ref()
    }

    /// True only while the process is known to be running. Does not poll.
    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }

    pub fn succeeded(&self) -> bool {
        self.state == JobState::Succeeded
    }

    /// Whether the job has reached a terminal state.
    ///
    /// For a running job this first polls the process (non-blocking) and
    /// finishes the job if it has exited since the last check.
    pub fn is_terminal(&mut self) -> bool {
        if self.state == JobState::Running {
            self.poll();
        }
        self.state.is_terminal()
    }

    /// Launch the job. Requires `Pending`.
    ///
    /// A spawn failure (missing binary, permissions, unwritable log dir)
    /// turns the job `Failed` immediately, with no exit code, and is returned
    /// as [`DagrunError::Spawn`].
    pub fn start(&mut self, launcher: &dyn Launcher) -> Result<()> {
        if self.state != JobState::Pending {
            return Err(DagrunError::InvalidTransition {
                job: self.spec.id.clone(),
                from: self.state,
            });
        }

        self.started_at = Some(Local::now());

        match self.spawn(launcher) {
            Ok(()) => {
                self.state = JobState::Running;
                info!(
                    job = %self.spec.id,
                    pid = ?self.pid,
                    command = ?self.spec.command,
                    "job started"
                );
                Ok(())
            }
            Err(source) => {
                self.finish(Outcome::Failed, None);
                Err(DagrunError::Spawn {
                    job: self.spec.id.clone(),
                    source,
                })
            }
        }
    }

    /// Starve a pending job: it will never run.
    ///
    /// No-op on terminal jobs. Starving a running job is rejected and leaves
    /// both the job and its process untouched.
    pub fn mark_starved(&mut self) -> Result<()> {
        match self.state {
            JobState::Pending => {
                match self.logs.create() {
                    Ok((_out, _err, stat)) => self.stat = Some(stat),
                    Err(err) => warn!(
                        job = %self.spec.id,
                        error = %err,
                        "failed to create log files for starved job"
                    ),
                }
                self.finish(Outcome::Starved, None);
                Ok(())
            }
            JobState::Running => Err(DagrunError::InvalidTransition {
                job: self.spec.id.clone(),
                from: self.state,
            }),
            JobState::Succeeded | JobState::Failed | JobState::Starved => Ok(()),
        }
    }

    fn spawn(&mut self, launcher: &dyn Launcher) -> io::Result<()> {
        let (out, err, stat) = self.logs.create()?;
        self.stat = Some(stat);

        let process = launcher.launch(&self.spec, out, err)?;
        self.pid = process.id();
        self.process = Some(process);
        Ok(())
    }

    fn poll(&mut self) {
        let Some(process) = self.process.as_mut() else {
            return;
        };

        match process.try_wait() {
            Ok(None) => {}
            Ok(Some(exit)) => self.on_exit(exit),
            Err(err) => {
                // Transient; the next tick polls again.
                warn!(
                    job = %self.spec.id,
                    pid = ?self.pid,
                    error = %err,
                    "failed to poll job process; treating it as still running"
                );
            }
        }
    }

    fn on_exit(&mut self, exit: ProcessExit) {
        let outcome = if exit.success() {
            Outcome::Succeeded
        } else {
            Outcome::Failed
        };

        match outcome {
            Outcome::Succeeded => info!(
                job = %self.spec.id,
                pid = ?self.pid,
                exit_code = ?exit.code,
                "job succeeded"
            ),
            _ => warn!(
                job = %self.spec.id,
                pid = ?self.pid,
                exit_code = ?exit.code,
                "job failed"
            ),
        }

        self.finish(outcome, exit.code);
    }

    /// Move into a terminal state, write the record and release the process
    /// and streams.
    fn finish(&mut self, outcome: Outcome, exit_code: Option<i32>) {
        self.state = outcome.into();
        self.exit_code = exit_code;
        let ended_at = Local::now();
        self.ended_at = Some(ended_at);
        self.process = None;

        let record = RunRecord {
            job_id: self.spec.id.clone(),
            start_time: self.started_at,
            end_time: ended_at,
            exit_code,
            pid: self.pid,
            outcome,
            succeeded: outcome == Outcome::Succeeded,
        };

        if let Err(err) = self.write_record(&record) {
            warn!(
                job = %self.spec.id,
                path = %self.logs.stat.display(),
                error = %err,
                "failed to write run record"
            );
        }

        debug!(job = %self.spec.id, %outcome, "job reached terminal state");
        self.record = Some(record);
    }

    fn write_record(&mut self, record: &RunRecord) -> Result<()> {
        let mut stat = match self.stat.take() {
            Some(file) => file,
            None => File::create(&self.logs.stat)?,
        };
        record.write_to(&mut stat)
    }
}
