// src/exec/process.rs

//! Real process launcher built on `tokio::process`.

use std::fs::File;
use std::io;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

use crate::dag::JobSpec;
use crate::exec::launcher::{Launcher, ProcessExit, ProcessHandle};

/// Spawns each job's argv directly (no shell) with its working directory and
/// environment overrides applied on top of the inherited environment.
///
/// Children are *not* killed when their handle is dropped; the scheduler has
/// no cancellation and a finished run must not take still-running jobs down
/// with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLauncher;

impl TokioLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl Launcher for TokioLauncher {
    fn launch(
        &self,
        spec: &JobSpec,
        stdout: File,
        stderr: File,
    ) -> io::Result<Box<dyn ProcessHandle>> {
        let (program, args) = spec.command.split_first().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("job '{}' has an empty command", spec.id),
            )
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(false);

        if let Some(dir) = &spec.homedir {
            cmd.current_dir(dir);
        }

        debug!(job = %spec.id, program = %program, ?args, "spawning job process");
        let child = cmd.spawn()?;

        Ok(Box::new(TokioProcess { child }))
    }
}

#[derive(Debug)]
struct TokioProcess {
    child: Child,
}

impl ProcessHandle for TokioProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
        let status = self.child.try_wait()?;
        Ok(status.map(|s| ProcessExit { code: s.code() }))
    }
}
