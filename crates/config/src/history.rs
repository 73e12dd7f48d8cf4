//! Declarations of history processors as they appear in configuration.
//!
//! These are raw, unvalidated parameter sets. The agent crate turns each
//! one into a validated processor before any history is touched.

use agentkit_core::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One entry of `agent.history_processors`.
///
/// Counts are signed so that a negative value reaches validation and is
/// reported as a parameter error instead of a schema error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum HistoryProcessorConfig {
    /// Pass the history through unchanged
    Default,

    /// Elide the content of all but the last `n` observations
    LastNObservations {
        n: i64,
        #[serde(default = "default_polling")]
        polling: i64,
        /// Never elide the first observation (usually the task statement)
        #[serde(default)]
        keep_first: bool,
        #[serde(default = "default_remove_tags")]
        always_remove_output_for_tags: BTreeSet<String>,
        #[serde(default = "default_keep_tags")]
        always_keep_output_for_tags: BTreeSet<String>,
    },

    /// Tag observations that answer calls to the named tools
    TagToolCallObservations {
        #[serde(default = "default_keep_tags")]
        tags: BTreeSet<String>,
        /// Empty means every tool
        #[serde(default)]
        function_names: BTreeSet<String>,
    },

    /// Place prompt-caching breakpoints on the newest entries
    CacheControl {
        #[serde(default = "default_last_n_messages")]
        last_n_messages: i64,
        #[serde(default)]
        last_n_messages_offset: i64,
        #[serde(default = "default_tagged_roles")]
        tagged_roles: Vec<Role>,
    },

    /// Strip regex matches from entry content
    RemoveRegex {
        #[serde(default = "default_remove_patterns")]
        remove: Vec<String>,
        #[serde(default)]
        keep_last: i64,
    },
}

impl HistoryProcessorConfig {
    /// The `type` tag of this declaration.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::LastNObservations { .. } => "last_n_observations",
            Self::TagToolCallObservations { .. } => "tag_tool_call_observations",
            Self::CacheControl { .. } => "cache_control",
            Self::RemoveRegex { .. } => "remove_regex",
        }
    }

    /// `last_n_observations` with default parameters.
    pub fn last_n_observations(n: i64) -> Self {
        Self::LastNObservations {
            n,
            polling: default_polling(),
            keep_first: false,
            always_remove_output_for_tags: default_remove_tags(),
            always_keep_output_for_tags: default_keep_tags(),
        }
    }

    /// `cache_control` with default roles and offset.
    pub fn cache_control(last_n_messages: i64) -> Self {
        Self::CacheControl {
            last_n_messages,
            last_n_messages_offset: 0,
            tagged_roles: default_tagged_roles(),
        }
    }

    /// `remove_regex` for the given patterns.
    pub fn remove_regex<S: Into<String>>(patterns: impl IntoIterator<Item = S>) -> Self {
        Self::RemoveRegex {
            remove: patterns.into_iter().map(Into::into).collect(),
            keep_last: 0,
        }
    }
}

pub(crate) fn default_history_processors() -> Vec<HistoryProcessorConfig> {
    vec![HistoryProcessorConfig::Default]
}

fn default_polling() -> i64 {
    1
}
fn default_last_n_messages() -> i64 {
    2
}
fn default_remove_tags() -> BTreeSet<String> {
    BTreeSet::from(["remove_output".to_string()])
}
fn default_keep_tags() -> BTreeSet<String> {
    BTreeSet::from(["keep_output".to_string()])
}
fn default_tagged_roles() -> Vec<Role> {
    vec![Role::User, Role::Tool]
}
fn default_remove_patterns() -> Vec<String> {
    vec!["<diff>.*</diff>".into()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_list_with_defaults() {
        let yaml = r#"
- type: default
- type: last_n_observations
  n: 5
- type: tag_tool_call_observations
  function_names: [edit]
- type: cache_control
  last_n_messages: 3
- type: remove_regex
"#;
        let parsed: Vec<HistoryProcessorConfig> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.len(), 5);
        assert_eq!(parsed[0], HistoryProcessorConfig::Default);
        assert_eq!(parsed[1], HistoryProcessorConfig::last_n_observations(5));
        assert!(matches!(
            &parsed[2],
            HistoryProcessorConfig::TagToolCallObservations { tags, function_names }
                if tags.contains("keep_output") && function_names.contains("edit")
        ));
        assert_eq!(parsed[3], HistoryProcessorConfig::cache_control(3));
        assert_eq!(parsed[4], HistoryProcessorConfig::remove_regex(["<diff>.*</diff>"]));
    }

    #[test]
    fn last_n_requires_n() {
        let result: Result<HistoryProcessorConfig, _> =
            serde_yaml::from_str("type: last_n_observations\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result: Result<HistoryProcessorConfig, _> = serde_yaml::from_str("type: summarize\n");
        assert!(result.is_err());
    }

    #[test]
    fn misspelled_parameter_is_rejected() {
        let result: Result<HistoryProcessorConfig, _> =
            serde_yaml::from_str("type: cache_control\nlast_n_mesages: 0\n");
        assert!(result.is_err());

        let result: Result<HistoryProcessorConfig, _> =
            serde_yaml::from_str("type: last_n_observations\nn: 3\npoling: 2\n");
        assert!(result.is_err());
    }

    #[test]
    fn negative_count_still_parses() {
        let parsed: HistoryProcessorConfig =
            serde_yaml::from_str("type: cache_control\nlast_n_messages: -1\n").unwrap();
        assert_eq!(parsed.kind(), "cache_control");
    }
}
