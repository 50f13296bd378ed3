#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use dagrun::config::{
    ConfigFile, DefaultsSection, JobConfig, OneOrMany, RawConfigFile, Script, WorkflowSection,
};
use dagrun::dag::JobSpec;

/// Builder for `JobSpec` to simplify graph / scheduler test setup.
pub struct JobSpecBuilder {
    spec: JobSpec,
}

impl JobSpecBuilder {
    /// A job running `true`; fake launchers never look at the command.
    pub fn new(id: &str) -> Self {
        Self {
            spec: JobSpec::new(id, vec!["true".to_string()]),
        }
    }

    pub fn command(mut self, argv: &[&str]) -> Self {
        self.spec.command = argv.iter().map(|s| s.to_string()).collect();
        self
    }

    /// `sh -c <script>`.
    pub fn shell(self, script: &str) -> Self {
        self.command(&["sh", "-c", script])
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.spec.depends_on.push(dep.to_string());
        self
    }

    pub fn requires_parent_success(mut self, val: bool) -> Self {
        self.spec.requires_parent_success = val;
        self
    }

    pub fn homedir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spec.homedir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.spec.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> JobSpec {
        self.spec
    }
}

/// Builder for `ConfigFile`.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                workflow: WorkflowSection::default(),
                defaults: DefaultsSection::default(),
                job: BTreeMap::new(),
            },
        }
    }

    pub fn with_job(mut self, id: &str, job: JobConfig) -> Self {
        self.config.job.insert(id.to_string(), job);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.config.workflow.name = Some(name.to_string());
        self
    }

    pub fn with_poll_interval(mut self, interval: &str) -> Self {
        self.config.workflow.poll_interval = Some(interval.to_string());
        self
    }

    pub fn with_default_env(mut self, key: &str, value: &str) -> Self {
        self.config
            .defaults
            .env
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_default_homedir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.defaults.homedir = Some(dir.into());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(script: &str) -> Self {
        Self {
            job: JobConfig {
                script: Script::Line(script.to_string()),
                depends_on: None,
                requires_parent_success: true,
                homedir: None,
                env: BTreeMap::new(),
            },
        }
    }

    pub fn argv(argv: &[&str]) -> Self {
        let mut builder = Self::new("");
        builder.job.script = Script::Argv(argv.iter().map(|s| s.to_string()).collect());
        builder
    }

    /// Append a dependency, keeping the list form.
    pub fn after(mut self, dep: &str) -> Self {
        let deps = match self.job.depends_on.take() {
            Some(existing) => {
                let mut v = existing.to_vec();
                v.push(dep.to_string());
                v
            }
            None => vec![dep.to_string()],
        };
        self.job.depends_on = Some(OneOrMany::Many(deps));
        self
    }

    pub fn requires_parent_success(mut self, val: bool) -> Self {
        self.job.requires_parent_success = val;
        self
    }

    pub fn homedir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.job.homedir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.job.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}
