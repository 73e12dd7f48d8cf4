//! Layered configuration loading.
//!
//! The loader never consults ambient state on its own. Environment values
//! are captured once into a [`LoaderEnv`] and handed over explicitly, so
//! the same inputs always produce the same effective configuration.

use crate::overrides::Override;
use crate::paths::resolve_relative;
use crate::source::ConfigSource;
use crate::value::{self, ConfigValue};
use crate::{AppConfig, ConfigError, paths};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the implicit base document inside the config directory.
pub const DEFAULT_CONFIG_FILE: &str = "default.yaml";

/// Environment inputs to configuration loading.
#[derive(Clone, Default)]
pub struct LoaderEnv {
    /// `AGENTKIT_CONFIG_ROOT`
    pub config_root: Option<PathBuf>,
    /// `AGENTKIT_CONFIG_DIR`
    pub config_dir: Option<PathBuf>,
    /// `AGENTKIT_API_KEY`
    pub api_key: Option<String>,
    /// `AGENTKIT_MODEL`
    pub model: Option<String>,
}

impl LoaderEnv {
    /// Read the agentkit variables from the process environment.
    pub fn from_process() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the agentkit variables from a `.env` file.
    ///
    /// Other variables in the file are ignored.
    pub fn from_dotenv(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
        let parse_error = |e: dotenvy::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let vars = dotenvy::from_path_iter(path)
            .map_err(parse_error)?
            .collect::<Result<BTreeMap<String, String>, _>>()
            .map_err(parse_error)?;
        tracing::debug!(path = %path.display(), vars = vars.len(), "Read env file");
        Ok(Self::from_lookup(|name| vars.get(name).cloned()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            config_root: var("AGENTKIT_CONFIG_ROOT").map(PathBuf::from),
            config_dir: var("AGENTKIT_CONFIG_DIR").map(PathBuf::from),
            api_key: var("AGENTKIT_API_KEY"),
            model: var("AGENTKIT_MODEL"),
        }
    }

    /// Keep every value already set here; take the rest from `fallback`.
    pub fn or(self, fallback: LoaderEnv) -> Self {
        Self {
            config_root: self.config_root.or(fallback.config_root),
            config_dir: self.config_dir.or(fallback.config_dir),
            api_key: self.api_key.or(fallback.api_key),
            model: self.model.or(fallback.model),
        }
    }
}

impl std::fmt::Debug for LoaderEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderEnv")
            .field("config_root", &self.config_root)
            .field("config_dir", &self.config_dir)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .finish()
    }
}

/// Builds the effective configuration from layered sources.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    root: PathBuf,
    config_dir: PathBuf,
    use_default: bool,
    sources: Vec<ConfigSource>,
    overrides: Vec<Override>,
    path_keys: Vec<String>,
    env: LoaderEnv,
}

impl ConfigLoader {
    /// A loader rooted at `root`, with the default source at
    /// `<root>/config/default.yaml`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = paths::normalize(&root.into());
        Self {
            config_dir: root.join("config"),
            root,
            use_default: true,
            sources: Vec::new(),
            overrides: Vec::new(),
            path_keys: Vec::new(),
            env: LoaderEnv::default(),
        }
    }

    /// A loader configured from captured environment values.
    ///
    /// Root precedence: `root_flag`, then `AGENTKIT_CONFIG_ROOT`, then
    /// `~/.agentkit`. A relative `AGENTKIT_CONFIG_DIR` is taken relative
    /// to the root.
    pub fn from_env(env: &LoaderEnv, root_flag: Option<PathBuf>) -> Self {
        let root = root_flag
            .or_else(|| env.config_root.clone())
            .unwrap_or_else(AppConfig::default_root);
        let mut loader = Self::new(root);
        if let Some(dir) = &env.config_dir {
            loader.config_dir = resolve_relative(&loader.root, dir);
        }
        loader.env = env.clone();
        loader
    }

    /// The directory relative paths resolve against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Location of the implicit base document.
    pub fn default_source(&self) -> PathBuf {
        self.config_dir.join(DEFAULT_CONFIG_FILE)
    }

    /// Override the config directory.
    pub fn with_config_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config_dir = resolve_relative(&self.root, dir.as_ref());
        self
    }

    /// Enable or disable the implicit default source.
    pub fn with_default(mut self, enabled: bool) -> Self {
        self.use_default = enabled;
        self
    }

    /// Append a source; later sources win.
    pub fn source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Append a file source.
    ///
    /// A relative path is tried as given first, then under the config root.
    pub fn file(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let path = if path.is_relative() && !path.exists() {
            let under_root = resolve_relative(&self.root, &path);
            if under_root.exists() { under_root } else { path }
        } else {
            path
        };
        self.source(ConfigSource::File(path))
    }

    /// Append a `key.path=value` override, applied after every source.
    pub fn set(mut self, entry: &str) -> Result<Self, ConfigError> {
        self.overrides.push(Override::parse(entry)?);
        Ok(self)
    }

    /// Treat string values at `key` (dotted) of the merged tree as paths.
    pub fn path_key(mut self, key: impl Into<String>) -> Self {
        self.path_keys.push(key.into());
        self
    }

    /// Merge every layer into a single tree.
    ///
    /// Path keys registered with [`ConfigLoader::path_key`] are resolved
    /// against the root; typed path fields are resolved by [`ConfigLoader::load`].
    pub fn load_tree(&self) -> Result<ConfigValue, ConfigError> {
        let mut tree = value::empty();

        let default_path = self.default_source();
        if self.use_default {
            if default_path.exists() {
                tracing::debug!(source = %default_path.display(), "Merging default config");
                value::merge(&mut tree, crate::source::load_file(&default_path)?);
            } else {
                tracing::debug!(
                    source = %default_path.display(),
                    "No default config found, skipping"
                );
            }
        }

        for source in &self.sources {
            tracing::debug!(source = %source.label(), "Merging config source");
            value::merge(&mut tree, source.load()?);
        }

        for o in &self.overrides {
            tracing::debug!(key = %o.key.join("."), "Applying override");
            value::merge(&mut tree, o.clone().into_tree());
        }

        if !self.path_keys.is_empty() {
            let keys: Vec<&str> = self.path_keys.iter().map(String::as_str).collect();
            paths::resolve_path_keys(&mut tree, &self.root, &keys);
        }

        Ok(tree)
    }

    /// Load, resolve, and validate the typed configuration.
    ///
    /// History processors are only checked for shape here. Building the
    /// pipeline validates their parameters; `agentkit_agent::load_agent`
    /// does both.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::from_tree(self.load_tree()?)?;
        config.resolve_paths(&self.root);

        // The process environment beats `env_var_path`
        let env = match &config.env_var_path {
            Some(path) => self.env.clone().or(LoaderEnv::from_dotenv(path.as_path())?),
            None => self.env.clone(),
        };

        // The model name always wins, the API key only fills a gap
        if let Some(model) = env.model {
            config.agent.model.name = model;
        }
        if config.agent.model.api_key.is_none() {
            config.agent.model.api_key = env.api_key;
        }

        config.problem_statement.resolve_id()?;
        config.validate()?;

        tracing::info!(
            root = %self.root.display(),
            sources = self.sources.len(),
            model = %config.agent.model.name,
            problem_statement = config.problem_statement.id().unwrap_or_default(),
            history_processors = config.agent.history_processors.len(),
            "Configuration loaded"
        );
        Ok(config)
    }
}
