// src/dag/record.rs

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::types::{JobId, Outcome};

/// Outcome record emitted once per job when it reaches a terminal state.
///
/// Serialized as TOML into the job's `.stat` file:
///
/// ```toml
/// job_id = "extract"
/// start_time = "2024-05-01T02:00:00.123+02:00"
/// end_time = "2024-05-01T02:03:12.456+02:00"
/// exit_code = 0
/// pid = 41235
/// outcome = "succeeded"
/// succeeded = true
/// ```
///
/// Starved jobs carry no `start_time`, `exit_code` or `pid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub job_id: JobId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Local>>,

    pub end_time: DateTime<Local>,

    /// Absent when starved, when the spawn failed, or when the process was
    /// killed by a signal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    pub outcome: Outcome,

    pub succeeded: bool,
}

impl RunRecord {
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn write_to(&self, writer: &mut impl Write) -> Result<()> {
        writer.write_all(self.to_toml()?.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Read a record back from a `.stat` file.
    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}
