//! Strip pattern matches from entry content.

use super::count_param;
use agentkit_core::{HistoryEntry, HistoryError};
use regex_lite::Regex;

const NAME: &str = "remove_regex";

/// Removes every match of each pattern from the content of all entries
/// except the newest `keep_last`.
///
/// Patterns are compiled with `.` matching newlines. Removal is repeated
/// until the content stops changing, so a second pass is always a no-op.
#[derive(Debug, Clone)]
pub struct RemoveRegex {
    patterns: Vec<Regex>,
    keep_last: usize,
}

impl RemoveRegex {
    pub fn new<S: AsRef<str>>(patterns: &[S], keep_last: i64) -> Result<Self, HistoryError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(&format!("(?s){p}")).map_err(|e| HistoryError::InvalidPattern {
                    pattern: p.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            keep_last: count_param(NAME, "keep_last", keep_last, 0)?,
        })
    }

    fn strip(&self, content: &str) -> String {
        let mut current = content.to_string();
        loop {
            let next = self
                .patterns
                .iter()
                .fold(current.clone(), |text, re| re.replace_all(&text, "").into_owned());
            if next == current {
                return current;
            }
            current = next;
        }
    }

    pub fn apply(&self, mut history: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
        if self.patterns.is_empty() {
            return history;
        }
        let stop = history.len().saturating_sub(self.keep_last);
        for entry in &mut history[..stop] {
            entry.content = self.strip(&entry.content);
        }
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::test_helpers::trajectory;

    #[test]
    fn removes_multiline_matches() {
        let processor = RemoveRegex::new(&["<diff>.*?</diff>"], 0).unwrap();
        let history = vec![HistoryEntry::assistant(
            "Applied.\n<diff>\n- old\n+ new\n</diff>\nDone.",
        )];
        let out = processor.apply(history);
        assert_eq!(out[0].content, "Applied.\n\nDone.");
    }

    #[test]
    fn applying_twice_is_a_no_op() {
        // Removing "ab" from "aabb" exposes a new "ab"
        let processor = RemoveRegex::new(&["ab", "<diff>.*</diff>"], 0).unwrap();
        let mut history = trajectory(2);
        history.push(HistoryEntry::user("aabb and <diff>x</diff> tail"));

        let once = processor.apply(history);
        let twice = processor.apply(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.last().unwrap().content, " and  tail");
    }

    #[test]
    fn keep_last_protects_newest_entries() {
        let processor = RemoveRegex::new(&["secret"], 1).unwrap();
        let history = vec![
            HistoryEntry::user("a secret here"),
            HistoryEntry::assistant("another secret"),
        ];
        let out = processor.apply(history);
        assert_eq!(out[0].content, "a  here");
        assert_eq!(out[1].content, "another secret");
    }

    #[test]
    fn order_and_count_are_preserved() {
        let history = trajectory(3);
        let out = RemoveRegex::new(&["output"], 0).unwrap().apply(history.clone());
        assert_eq!(out.len(), history.len());
        for (before, after) in history.iter().zip(&out) {
            assert_eq!(before.id, after.id);
        }
    }

    #[test]
    fn invalid_pattern_fails_at_construction() {
        assert!(matches!(
            RemoveRegex::new(&["(unclosed"], 0),
            Err(HistoryError::InvalidPattern { .. })
        ));
        assert!(RemoveRegex::new(&["ok"], -1).is_err());
    }

    #[test]
    fn empty_match_pattern_terminates() {
        let processor = RemoveRegex::new(&["x*"], 0).unwrap();
        let out = processor.apply(vec![HistoryEntry::user("axxb")]);
        assert_eq!(out[0].content, "ab");
    }
}
