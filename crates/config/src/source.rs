//! Configuration sources and format detection.

use crate::value::{ConfigValue, empty};
use agentkit_core::ConfigError;
use std::path::{Path, PathBuf};

/// One layer of configuration.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// A YAML or TOML file on disk.
    File(PathBuf),
    /// A pre-parsed tree; `name` is used in error messages and logs.
    Inline { name: String, tree: ConfigValue },
}

impl ConfigSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn inline(name: impl Into<String>, tree: ConfigValue) -> Self {
        Self::Inline {
            name: name.into(),
            tree,
        }
    }

    /// Human-readable label for logs.
    pub fn label(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Inline { name, .. } => name.clone(),
        }
    }

    /// Read and parse this source into a mapping tree.
    pub fn load(&self) -> Result<ConfigValue, ConfigError> {
        match self {
            Self::File(path) => load_file(path),
            Self::Inline { name, tree } => ensure_mapping(tree.clone(), Path::new(name)),
        }
    }
}

/// Document syntax, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Toml,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

/// Load a configuration file. A missing file is an error.
pub fn load_file(path: &Path) -> Result<ConfigValue, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    parse_str(&content, Format::from_path(path), path)
}

/// Parse document text. `origin` only labels errors.
pub fn parse_str(content: &str, format: Format, origin: &Path) -> Result<ConfigValue, ConfigError> {
    let parse_err = |reason: String| ConfigError::Parse {
        path: origin.to_path_buf(),
        reason,
    };

    let tree = match format {
        Format::Yaml => {
            if content.trim().is_empty() {
                return Ok(empty());
            }
            serde_yaml::from_str::<ConfigValue>(content).map_err(|e| parse_err(e.to_string()))?
        }
        Format::Toml => {
            let table: toml::Table = toml::from_str(content).map_err(|e| parse_err(e.to_string()))?;
            serde_yaml::to_value(table).map_err(|e| parse_err(e.to_string()))?
        }
    };

    ensure_mapping(tree, origin)
}

fn ensure_mapping(tree: ConfigValue, origin: &Path) -> Result<ConfigValue, ConfigError> {
    match tree {
        ConfigValue::Mapping(_) => Ok(tree),
        ConfigValue::Null => Ok(empty()),
        other => Err(ConfigError::Parse {
            path: origin.to_path_buf(),
            reason: format!("top level must be a mapping, found {}", kind_name(&other)),
        }),
    }
}

fn kind_name(value: &ConfigValue) -> &'static str {
    match value {
        ConfigValue::Null => "null",
        ConfigValue::Bool(_) => "a boolean",
        ConfigValue::Number(_) => "a number",
        ConfigValue::String(_) => "a string",
        ConfigValue::Sequence(_) => "a sequence",
        ConfigValue::Mapping(_) => "a mapping",
        ConfigValue::Tagged(_) => "a tagged value",
    }
}
