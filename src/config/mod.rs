// src/config/mod.rs

//! Configuration loading and validation for dagrun.
//!
//! Responsibilities:
//! - Render the file as a template (`template.rs`).
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like DAG correctness (`validate.rs`).
//! - Resolve validated jobs into the strict [`JobSpec`](crate::dag::JobSpec)
//!   shape the scheduler consumes (dependency lists, argv, homedir, env).

pub mod loader;
pub mod model;
pub mod template;
pub mod validate;

pub use loader::{config_dir, default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, DefaultsSection, JobConfig, OneOrMany, RawConfigFile, Script, WorkflowSection,
};
pub use template::render_config;
pub use validate::validate_workflow_name;
