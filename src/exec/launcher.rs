// src/exec/launcher.rs

//! Pluggable process launcher abstraction.

use std::fmt;
use std::fs::File;
use std::io;

use crate::dag::JobSpec;

/// How a job process ended.
///
/// `code` is `None` when the process was terminated by a signal and never
/// produced an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn with_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Success is exactly exit code 0; anything else (including a signal) is
    /// a failure.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A live, spawned job process.
pub trait ProcessHandle: Send + fmt::Debug {
    /// OS process id, if still known.
    fn id(&self) -> Option<u32>;

    /// Non-blocking status check.
    ///
    /// Returns `Ok(None)` while the process is still running. Must never wait
    /// for the process to exit.
    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>>;
}

/// Trait abstracting how job processes are spawned.
///
/// Production code uses [`TokioLauncher`](super::TokioLauncher); tests can
/// provide their own implementation that doesn't spawn real processes.
pub trait Launcher: Send + fmt::Debug {
    /// Spawn `spec.command` with stdout/stderr redirected to the given files.
    ///
    /// Spawning is fire-and-forget: the returned handle is polled later.
    fn launch(
        &self,
        spec: &JobSpec,
        stdout: File,
        stderr: File,
    ) -> io::Result<Box<dyn ProcessHandle>>;
}
