// src/rundir.rs

//! Per-run log directory layout and the workflow pid lock.
//!
//! ```text
//! <log_root>/<workflow>/
//!     <workflow>.pid
//!     latest -> <unix_ts>/
//!     <unix_ts>/
//!         <job>.out
//!         <job>.err
//!         <job>.stat
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::errors::{DagrunError, Result};

/// Name of the symlink pointing at the most recent run directory.
pub const LATEST_LINK: &str = "latest";

/// A freshly created, run-scoped log directory.
#[derive(Debug, Clone)]
pub struct RunDir {
    /// `<log_root>/<workflow>`; shared by all runs of the workflow.
    flow_root: PathBuf,
    /// `<flow_root>/<unix_ts>`; this run's job log directory.
    dir: PathBuf,
}

impl RunDir {
    /// Create `<log_root>/<workflow>/<unix_ts>/` and repoint `latest` at it.
    ///
    /// If two runs start within the same second, the later one gets a `-N`
    /// suffix instead of sharing a directory.
    pub fn create(log_root: &Path, workflow: &str) -> Result<Self> {
        let flow_root = log_root.join(workflow);
        fs::create_dir_all(&flow_root)?;

        let stamp = Utc::now().timestamp().to_string();
        let dir = create_unique_dir(&flow_root, &stamp)?;

        let run_dir = Self { flow_root, dir };
        if let Err(err) = run_dir.update_latest_link() {
            warn!(
                dir = %run_dir.dir.display(),
                error = %err,
                "failed to update 'latest' symlink"
            );
        }

        debug!(dir = %run_dir.dir.display(), "run log directory created");
        Ok(run_dir)
    }

    /// Directory the jobs of this run log into.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn flow_root(&self) -> &Path {
        &self.flow_root
    }

    pub fn latest_link(&self) -> PathBuf {
        self.flow_root.join(LATEST_LINK)
    }

    #[cfg(unix)]
    fn update_latest_link(&self) -> io::Result<()> {
        let link = self.latest_link();
        if fs::symlink_metadata(&link).is_ok() {
            fs::remove_file(&link)?;
        }
        std::os::unix::fs::symlink(&self.dir, &link)
    }

    #[cfg(not(unix))]
    fn update_latest_link(&self) -> io::Result<()> {
        debug!("'latest' symlink is only maintained on unix");
        Ok(())
    }
}

fn create_unique_dir(parent: &Path, stamp: &str) -> Result<PathBuf> {
    let mut candidate = parent.join(stamp);
    let mut suffix = 1;
    loop {
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                candidate = parent.join(format!("{stamp}-{suffix}"));
                suffix += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Exclusive per-workflow lock, held as a pid file for the duration of a run.
///
/// The file is removed when the lock is dropped. A leftover file from a
/// crashed run has to be removed by hand.
#[derive(Debug)]
pub struct PidLock {
    path: PathBuf,
}

impl PidLock {
    /// `<flow_root>/<workflow>.pid`.
    pub fn path_for(log_root: &Path, workflow: &str) -> PathBuf {
        log_root.join(workflow).join(format!("{workflow}.pid"))
    }

    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(DagrunError::AlreadyRunning { pid_file: path });
            }
            Err(err) => return Err(err.into()),
        };

        // Hold the lock from here on, so a failed write still cleans up.
        let lock = Self { path };
        writeln!(file, "{}", std::process::id())?;
        debug!(path = %lock.path.display(), "pid lock acquired");
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %err, "failed to remove pid file");
        }
    }
}
