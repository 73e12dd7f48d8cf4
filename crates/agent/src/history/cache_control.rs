//! Prompt-caching breakpoints on the newest entries.

use super::count_param;
use agentkit_core::{CacheControl, HistoryEntry, HistoryError, Role};

const NAME: &str = "cache_control";

/// Marks the newest `last_n_messages` entries whose role is in
/// `tagged_roles` with an ephemeral cache breakpoint, skipping the newest
/// `last_n_messages_offset` entries. Markers left by earlier runs are
/// cleared first, so exactly the selected entries carry one.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheControlHistoryProcessor {
    last_n_messages: usize,
    last_n_messages_offset: usize,
    tagged_roles: Vec<Role>,
}

impl CacheControlHistoryProcessor {
    pub fn new(
        last_n_messages: i64,
        last_n_messages_offset: i64,
        tagged_roles: Vec<Role>,
    ) -> Result<Self, HistoryError> {
        if tagged_roles.is_empty() {
            return Err(HistoryError::invalid(NAME, "tagged_roles must not be empty"));
        }
        Ok(Self {
            last_n_messages: count_param(NAME, "last_n_messages", last_n_messages, 1)?,
            last_n_messages_offset: count_param(
                NAME,
                "last_n_messages_offset",
                last_n_messages_offset,
                0,
            )?,
            tagged_roles,
        })
    }

    pub fn last_n_messages(&self) -> usize {
        self.last_n_messages
    }

    pub fn apply(&self, mut history: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
        let mut n_tagged = 0;
        for (i_reversed, entry) in history.iter_mut().rev().enumerate() {
            entry.cache_control = None;
            if n_tagged < self.last_n_messages
                && i_reversed >= self.last_n_messages_offset
                && self.tagged_roles.contains(&entry.role)
            {
                entry.cache_control = Some(CacheControl::ephemeral());
                n_tagged += 1;
            }
        }
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::test_helpers::trajectory;

    fn marked(history: &[HistoryEntry]) -> Vec<usize> {
        history
            .iter()
            .enumerate()
            .filter(|(_, e)| e.cache_control.is_some())
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn marks_newest_entries_with_tagged_roles() {
        // 0 sys, 1 user, then action/observation pairs: observations at 3, 5, 7
        let processor =
            CacheControlHistoryProcessor::new(2, 0, vec![Role::User, Role::Tool]).unwrap();
        let out = processor.apply(trajectory(3));
        assert_eq!(marked(&out), vec![5, 7]);
        assert_eq!(out[7].cache_control, Some(CacheControl::ephemeral()));
    }

    #[test]
    fn offset_skips_newest_entries() {
        let processor =
            CacheControlHistoryProcessor::new(2, 2, vec![Role::User, Role::Tool]).unwrap();
        let out = processor.apply(trajectory(3));
        assert_eq!(marked(&out), vec![3, 5]);
    }

    #[test]
    fn stale_markers_are_cleared() {
        let processor = CacheControlHistoryProcessor::new(1, 0, vec![Role::Tool]).unwrap();
        let once = processor.apply(trajectory(2));
        assert_eq!(marked(&once), vec![5]);

        // A new turn arrives; the old breakpoint moves forward
        let mut next = once;
        next.push(HistoryEntry::tool_result("call-x", "more output"));
        let twice = processor.apply(next);
        assert_eq!(marked(&twice), vec![6]);
    }

    #[test]
    fn fewer_candidates_than_requested() {
        let processor =
            CacheControlHistoryProcessor::new(10, 0, vec![Role::User, Role::Tool]).unwrap();
        let out = processor.apply(trajectory(1));
        assert_eq!(marked(&out), vec![1, 3]);
    }

    #[test]
    fn zero_messages_fails_at_construction() {
        assert!(matches!(
            CacheControlHistoryProcessor::new(0, 0, vec![Role::User]),
            Err(HistoryError::InvalidParameter { .. })
        ));
        assert!(CacheControlHistoryProcessor::new(2, -1, vec![Role::User]).is_err());
        assert!(CacheControlHistoryProcessor::new(2, 0, vec![]).is_err());
    }
}
