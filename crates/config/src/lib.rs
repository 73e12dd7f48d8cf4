//! Configuration loading, merging, and validation for agentkit.
//!
//! Configuration is layered: an implicit `default.yaml` under the config
//! directory, then every `--config` source in order, then `--set`
//! overrides. Layers are deep-merged as untyped trees (see [`value::merge`]),
//! relative paths are resolved against an explicit config root, and the
//! result is deserialized into [`AppConfig`] and validated.
//!
//! Loading checks history processor declarations for shape only (known
//! `type`, known keys). Their parameters are validated when the agent
//! builds its pipeline; `agentkit_agent::load_agent` loads and builds in
//! one step so both kinds of error surface before any model query.

pub mod history;
pub mod loader;
pub mod overrides;
pub mod paths;
pub mod problem;
pub mod source;
pub mod suggest;
pub mod value;

pub use agentkit_core::ConfigError;
pub use history::HistoryProcessorConfig;
pub use loader::{ConfigLoader, LoaderEnv};
pub use overrides::Override;
pub use paths::{ConfigPath, resolve_path_keys, resolve_relative};
pub use problem::ProblemStatementConfig;
pub use source::{ConfigSource, Format};
pub use value::{ConfigValue, merge, merge_all};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Dotted keys of every path-typed field of [`AppConfig`], for resolving
/// the same values in an untyped tree.
pub const PATH_KEYS: &[&str] = &[
    "output_dir",
    "env_var_path",
    "agent.tools.bundles.path",
    "agent.templates.demonstrations",
    "problem_statement.path",
];

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Agent configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// The task to solve
    #[serde(default)]
    pub problem_statement: ProblemStatementConfig,

    /// Where trajectories and predictions are written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<ConfigPath>,

    /// A `.env`-style file with extra environment variables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_var_path: Option<ConfigPath>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default = "default_agent_name")]
    pub name: String,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    /// Applied to the history, in order, before every model query
    #[serde(default = "history::default_history_processors")]
    pub history_processors: Vec<HistoryProcessorConfig>,
}

fn default_agent_name() -> String {
    "main".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            model: ModelConfig::default(),
            templates: TemplatesConfig::default(),
            tools: ToolsConfig::default(),
            history_processors: history::default_history_processors(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub name: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Cost limit in USD per task instance (0 = unlimited)
    #[serde(default = "default_cost_limit")]
    pub per_instance_cost_limit: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_top_p() -> f32 {
    1.0
}
fn default_cost_limit() -> f64 {
    3.0
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            per_instance_cost_limit: default_cost_limit(),
            api_key: None,
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("name", &self.name)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("per_instance_cost_limit", &self.per_instance_cost_limit)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplatesConfig {
    #[serde(default)]
    pub system_template: String,

    #[serde(default)]
    pub instance_template: String,

    #[serde(default = "default_next_step_template")]
    pub next_step_template: String,

    #[serde(default = "default_no_output_template")]
    pub next_step_no_output_template: String,

    /// Demonstration trajectories shown before the task
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub demonstrations: Vec<ConfigPath>,
}

fn default_next_step_template() -> String {
    "Observation: {{observation}}".into()
}
fn default_no_output_template() -> String {
    "Your command ran successfully and did not produce any output.".into()
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            system_template: String::new(),
            instance_template: String::new(),
            next_step_template: default_next_step_template(),
            next_step_no_output_template: default_no_output_template(),
            demonstrations: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    #[serde(default)]
    pub bundles: Vec<BundleConfig>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env_variables: BTreeMap<String, String>,

    #[serde(default = "default_true")]
    pub enable_bash_tool: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            bundles: vec![],
            env_variables: BTreeMap::new(),
            enable_bash_tool: true,
        }
    }
}

/// A directory of tools installed into the agent's environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleConfig {
    pub path: ConfigPath,
}

impl AppConfig {
    /// Build the typed config from a merged tree.
    ///
    /// Unknown keys are rejected. When the tree holds a key that belongs
    /// elsewhere, the error says where.
    pub fn from_tree(tree: ConfigValue) -> Result<Self, ConfigError> {
        let hints = suggest::misplaced_keys(&tree);
        serde_yaml::from_value(tree).map_err(|e| {
            let mut message = e.to_string();
            for hint in &hints {
                message.push_str("; ");
                message.push_str(hint);
            }
            ConfigError::Schema(message)
        })
    }

    /// The root used when neither `--config-root` nor
    /// `AGENTKIT_CONFIG_ROOT` names one (`~/.agentkit`).
    pub fn default_root() -> PathBuf {
        paths::home_dir().join(".agentkit")
    }

    /// Resolve every path-typed field against `root`.
    pub fn resolve_paths(&mut self, root: &Path) {
        let optional = [&mut self.output_dir, &mut self.env_var_path];
        for p in optional.into_iter().flatten() {
            p.resolve(root);
        }
        for bundle in &mut self.agent.tools.bundles {
            bundle.path.resolve(root);
        }
        for demo in &mut self.agent.templates.demonstrations {
            demo.resolve(root);
        }
        self.problem_statement.resolve_path(root);
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let model = &self.agent.model;
        if !(0.0..=2.0).contains(&model.temperature) {
            return Err(ConfigError::Validation(
                "agent.model.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&model.top_p) {
            return Err(ConfigError::Validation(
                "agent.model.top_p must be between 0.0 and 1.0".into(),
            ));
        }

        if model.per_instance_cost_limit < 0.0 {
            return Err(ConfigError::Validation(
                "agent.model.per_instance_cost_limit must be >= 0".into(),
            ));
        }

        if model.name.trim().is_empty() {
            return Err(ConfigError::Validation("agent.model.name must not be empty".into()));
        }

        self.problem_statement.validate()
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.agent.model.api_key.is_some()
    }

    /// Render as YAML (for `config show --typed`).
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Schema(e.to_string()))
    }
}
