//! Command-line `key.path=value` overrides.

use crate::value::ConfigValue;
use agentkit_core::ConfigError;
use serde_yaml::Mapping;

/// A single parsed override, e.g. `agent.model.name=gpt-4o`.
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub key: Vec<String>,
    pub value: ConfigValue,
}

impl Override {
    /// Parse `key.path=value`. The value is read as YAML so `3`, `true` and
    /// `[a, b]` keep their types. Block structures (`a: b`, `- a`) and
    /// anything unparsable stay a plain string.
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidOverride {
            entry: entry.to_string(),
            reason: reason.to_string(),
        };

        let (key, raw) = entry
            .split_once('=')
            .ok_or_else(|| invalid("expected key=value"))?;

        let key: Vec<String> = key.trim().split('.').map(str::to_string).collect();
        if key.iter().any(|segment| segment.trim().is_empty()) {
            return Err(invalid("empty key segment"));
        }

        let value = if raw.trim().is_empty() {
            ConfigValue::String(String::new())
        } else {
            parse_value(raw)
        };

        Ok(Self { key, value })
    }

    /// Build the nested single-leaf document this override stands for.
    pub fn into_tree(self) -> ConfigValue {
        self.key.into_iter().rev().fold(self.value, |inner, segment| {
            let mut map = Mapping::new();
            map.insert(ConfigValue::String(segment), inner);
            ConfigValue::Mapping(map)
        })
    }
}

/// A scalar or a flow collection keeps its YAML type; everything else is text.
fn parse_value(raw: &str) -> ConfigValue {
    let flow = raw.trim_start().starts_with(['[', '{']);
    match serde_yaml::from_str::<ConfigValue>(raw) {
        Ok(value) if flow || !(value.is_mapping() || value.is_sequence()) => value,
        _ => ConfigValue::String(raw.to_string()),
    }
}
