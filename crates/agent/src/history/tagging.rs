//! Tag observations produced by selected tools.

use agentkit_core::{HistoryEntry, HistoryError, Role};
use std::collections::{BTreeSet, HashMap};

const NAME: &str = "tag_tool_call_observations";

/// Adds `tags` to every observation that answers a call to one of
/// `function_names` (any tool when the set is empty).
///
/// Typical use is tagging the output of an editing tool with
/// `keep_output` so that [`LastNObservations`](super::LastNObservations)
/// never elides it.
#[derive(Debug, Clone, PartialEq)]
pub struct TagToolCallObservations {
    tags: BTreeSet<String>,
    function_names: BTreeSet<String>,
}

impl TagToolCallObservations {
    pub fn new(
        tags: BTreeSet<String>,
        function_names: BTreeSet<String>,
    ) -> Result<Self, HistoryError> {
        if tags.is_empty() {
            return Err(HistoryError::invalid(NAME, "tags must not be empty"));
        }
        if tags.iter().any(|t| t.trim().is_empty()) {
            return Err(HistoryError::invalid(NAME, "tags must not be blank"));
        }
        Ok(Self {
            tags,
            function_names,
        })
    }

    fn matches(&self, tool_name: &str) -> bool {
        self.function_names.is_empty() || self.function_names.contains(tool_name)
    }

    pub fn apply(&self, mut history: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
        // call id -> tool name, for calls seen so far
        let mut calls: HashMap<String, String> = HashMap::new();
        // tool names of the most recent assistant entry, for observations
        // that carry no tool_call_id
        let mut last_action: Vec<String> = Vec::new();

        for entry in &mut history {
            if entry.role == Role::Assistant {
                last_action.clear();
                for call in &entry.tool_calls {
                    calls.insert(call.id.clone(), call.name.clone());
                    last_action.push(call.name.clone());
                }
                continue;
            }
            if !entry.is_observation() {
                continue;
            }

            let answered = match &entry.tool_call_id {
                Some(id) => calls.get(id).is_some_and(|name| self.matches(name)),
                None => last_action.iter().any(|name| self.matches(name)),
            };
            if answered {
                entry.tags.extend(self.tags.iter().cloned());
            }
        }
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::test_helpers::{trajectory, trajectory_with};

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tags_only_selected_tools() {
        let history = trajectory_with(4, |i| if i % 2 == 0 { "edit" } else { "bash" });
        let processor = TagToolCallObservations::new(set(&["keep_output"]), set(&["edit"])).unwrap();
        let out = processor.apply(history.clone());

        assert_eq!(out.len(), history.len());
        let tagged: Vec<bool> = out
            .iter()
            .filter(|e| e.is_observation())
            .map(|e| e.tags.contains("keep_output"))
            .collect();
        assert_eq!(tagged, vec![true, false, true, false]);

        // Order and content are unchanged
        for (before, after) in history.iter().zip(&out) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.content, after.content);
        }
    }

    #[test]
    fn empty_function_names_matches_every_tool() {
        let processor = TagToolCallObservations::new(set(&["seen"]), BTreeSet::new()).unwrap();
        let out = processor.apply(trajectory(3));
        assert!(out.iter().filter(|e| e.is_observation()).all(|e| e.tags.contains("seen")));
        assert!(out.iter().filter(|e| !e.is_observation()).all(|e| e.tags.is_empty()));
    }

    #[test]
    fn observation_without_call_id_uses_preceding_action() {
        let mut history = trajectory_with(2, |i| if i == 0 { "edit" } else { "bash" });
        for entry in &mut history {
            entry.tool_call_id = None;
        }
        let processor = TagToolCallObservations::new(set(&["keep_output"]), set(&["edit"])).unwrap();
        let out = processor.apply(history);
        assert!(out[3].tags.contains("keep_output"));
        assert!(out[5].tags.is_empty());
    }

    #[test]
    fn empty_tags_fail_at_construction() {
        assert!(matches!(
            TagToolCallObservations::new(BTreeSet::new(), BTreeSet::new()),
            Err(HistoryError::InvalidParameter { .. })
        ));
    }
}
