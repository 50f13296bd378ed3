// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{JobId, JobState};

#[derive(Error, Debug)]
pub enum DagrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error("Invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("Duplicate job id: {0}")]
    DuplicateJob(JobId),

    #[error("Job id '{0}' is reserved for the synthetic root")]
    ReservedJobId(JobId),

    #[error("Job '{0}' has an empty command")]
    EmptyCommand(JobId),

    #[error("Job '{job}' depends on unknown job '{dependency}'")]
    UnknownDependency { job: JobId, dependency: JobId },

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("Failed to spawn job '{job}': {source}")]
    Spawn {
        job: JobId,
        #[source]
        source: std::io::Error,
    },

    #[error("Job '{job}' cannot make this transition from state {from:?}")]
    InvalidTransition { job: JobId, from: JobState },

    #[error("Workflow already running (pid file {pid_file:?} exists)")]
    AlreadyRunning { pid_file: PathBuf },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagrunError>;
