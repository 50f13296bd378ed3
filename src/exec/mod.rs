// src/exec/mod.rs

//! Process execution layer.
//!
//! The scheduling core never touches `tokio::process` directly; it talks to a
//! [`Launcher`] that turns a [`JobSpec`](crate::dag::JobSpec) into a live
//! [`ProcessHandle`].
//!
//! - [`launcher`] defines the `Launcher` / `ProcessHandle` traits and the
//!   exit summary the core consumes.
//! - [`process`] is the production implementation built on
//!   `tokio::process::Command`.
//!
//! Tests swap in a fake launcher that scripts exit codes and spawn failures
//! without running anything.

pub mod launcher;
pub mod process;

pub use launcher::{Launcher, ProcessExit, ProcessHandle};
pub use process::TokioLauncher;
