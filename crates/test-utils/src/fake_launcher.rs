use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::sync::{Arc, Mutex};

use dagrun::dag::JobSpec;
use dagrun::exec::{Launcher, ProcessExit, ProcessHandle};

/// Scripted behaviour for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBehaviour {
    /// Exit with `code` once polled `after_polls + 1` times.
    Exit { code: i32, after_polls: u32 },
    /// Die from a signal (no exit code).
    Signal { after_polls: u32 },
    /// Exit with `code` only after `after_polls` *failed* polls.
    PollErrors { code: i32, after_polls: u32 },
    /// `launch` itself fails, as for a missing binary.
    SpawnError,
}

#[derive(Debug, Default)]
struct FakeState {
    behaviours: HashMap<String, FakeBehaviour>,
    launched: Vec<String>,
    next_pid: u32,
}

/// A fake launcher that:
/// - records which jobs were launched, in order
/// - hands out processes that exit with a scripted code (0 by default) on
///   their first poll, or later, or never spawn at all.
///
/// Cloning shares the underlying state, so a test can keep a handle after
/// moving a clone into the scheduler.
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    state: Arc<Mutex<FakeState>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, job: &str, behaviour: FakeBehaviour) -> Self {
        self.state
            .lock()
            .unwrap()
            .behaviours
            .insert(job.to_string(), behaviour);
        self
    }

    pub fn exit_with(self, job: &str, code: i32) -> Self {
        self.with(job, FakeBehaviour::Exit { code, after_polls: 0 })
    }

    pub fn exit_after(self, job: &str, code: i32, after_polls: u32) -> Self {
        self.with(job, FakeBehaviour::Exit { code, after_polls })
    }

    pub fn fail_spawn(self, job: &str) -> Self {
        self.with(job, FakeBehaviour::SpawnError)
    }

    /// Every launch attempt, in order (spawn failures included).
    pub fn launched(&self) -> Vec<String> {
        self.state.lock().unwrap().launched.clone()
    }

    pub fn launch_count(&self, job: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .launched
            .iter()
            .filter(|j| *j == job)
            .count()
    }
}

impl Launcher for FakeLauncher {
    fn launch(
        &self,
        spec: &JobSpec,
        _stdout: File,
        _stderr: File,
    ) -> io::Result<Box<dyn ProcessHandle>> {
        let mut state = self.state.lock().unwrap();
        state.launched.push(spec.id.clone());

        let behaviour = state
            .behaviours
            .get(&spec.id)
            .copied()
            .unwrap_or(FakeBehaviour::Exit { code: 0, after_polls: 0 });

        if behaviour == FakeBehaviour::SpawnError {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("fake spawn failure for '{}'", spec.id),
            ));
        }

        state.next_pid += 1;
        Ok(Box::new(FakeProcess {
            pid: 10_000 + state.next_pid,
            behaviour,
            polls: 0,
        }))
    }
}

#[derive(Debug)]
struct FakeProcess {
    pid: u32,
    behaviour: FakeBehaviour,
    polls: u32,
}

impl ProcessHandle for FakeProcess {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
        let polls = self.polls;
        self.polls += 1;

        match self.behaviour {
            FakeBehaviour::Exit { code, after_polls } => {
                Ok((polls >= after_polls).then(|| ProcessExit::with_code(code)))
            }
            FakeBehaviour::Signal { after_polls } => {
                Ok((polls >= after_polls).then_some(ProcessExit { code: None }))
            }
            FakeBehaviour::PollErrors { code, after_polls } => {
                if polls < after_polls {
                    Err(io::Error::new(io::ErrorKind::Interrupted, "fake poll failure"))
                } else {
                    Ok(Some(ProcessExit::with_code(code)))
                }
            }
            FakeBehaviour::SpawnError => Ok(None),
        }
    }
}
