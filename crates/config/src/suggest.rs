//! Hints for keys that are commonly written in the wrong place.

use crate::value::{ConfigValue, get_path};

/// `(misplaced key, where it belongs)`, most specific first.
const MISPLACED_KEYS: &[(&str, &str)] = &[
    ("model.name", "agent.model.name"),
    ("model.per_instance_cost_limit", "agent.model.per_instance_cost_limit"),
    ("model", "agent.model.name"),
    ("agent.model", "agent.model.name"),
    ("per_instance_cost_limit", "agent.model.per_instance_cost_limit"),
    ("config_file", "--config"),
];

/// One line per misplaced key found in `tree`.
///
/// `agent.model` only counts when it is written as a bare value instead of a
/// mapping. A shorter key is skipped once a longer one below it has matched.
pub fn misplaced_keys(tree: &ConfigValue) -> Vec<String> {
    let mut hints: Vec<String> = Vec::new();
    let mut matched: Vec<&str> = Vec::new();

    for &(key, replacement) in MISPLACED_KEYS {
        let Some(value) = get_path(tree, key) else {
            continue;
        };
        if key == "agent.model" && value.is_mapping() {
            continue;
        }
        if matched.iter().any(|m| m.starts_with(key) && m[key.len()..].starts_with('.')) {
            continue;
        }
        matched.push(key);
        hints.push(format!("did you mean `{replacement}` instead of `{key}`?"));
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(yaml: &str) -> ConfigValue {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn top_level_model_name() {
        let hints = misplaced_keys(&tree("model:\n  name: claude\n"));
        assert_eq!(hints, vec!["did you mean `agent.model.name` instead of `model.name`?"]);
    }

    #[test]
    fn bare_agent_model() {
        let hints = misplaced_keys(&tree("agent:\n  model: claude\n"));
        assert_eq!(hints, vec!["did you mean `agent.model.name` instead of `agent.model`?"]);
        assert!(misplaced_keys(&tree("agent:\n  model:\n    name: claude\n")).is_empty());
    }

    #[test]
    fn several_hints() {
        let hints = misplaced_keys(&tree("model: claude\nper_instance_cost_limit: 2\nconfig_file: a.yaml\n"));
        assert_eq!(hints.len(), 3);
        assert!(hints[2].contains("--config"));
    }
}
