//! Subcommand implementations and the argument groups they share.

pub mod config_cmd;
pub mod history;

use agentkit_config::{ConfigError, ConfigLoader, LoaderEnv};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Where configuration comes from; shared by every command that loads it.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Config file to layer on top of the default (repeatable; later files win)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub configs: Vec<PathBuf>,

    /// Override a single value, e.g. --set agent.model.name=gpt-4o (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Do not load the implicit default config
    #[arg(long)]
    pub no_default: bool,
}

impl SourceArgs {
    /// Build a loader from the process environment and these arguments.
    pub fn loader(&self, root: Option<PathBuf>) -> Result<ConfigLoader, ConfigError> {
        self.loader_with_env(&LoaderEnv::from_process(), root)
    }

    pub fn loader_with_env(
        &self,
        env: &LoaderEnv,
        root: Option<PathBuf>,
    ) -> Result<ConfigLoader, ConfigError> {
        let mut loader = ConfigLoader::from_env(env, root).with_default(!self.no_default);
        for path in &self.configs {
            loader = loader.file(path);
        }
        for entry in &self.overrides {
            loader = loader.set(entry)?;
        }
        Ok(loader)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
    Toml,
}
