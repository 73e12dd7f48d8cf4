//! Bound context size by eliding all but the most recent observations.

use super::count_param;
use agentkit_core::{HistoryEntry, HistoryError};
use std::collections::{BTreeSet, HashSet};

const NAME: &str = "last_n_observations";

/// Keeps the payload of the last `n` observations and replaces the content
/// of earlier ones with a short placeholder.
///
/// With `polling > 1` the cutoff only advances every `polling`
/// observations, so the elided prefix stays identical across several
/// consecutive queries.
#[derive(Debug, Clone, PartialEq)]
pub struct LastNObservations {
    n: usize,
    polling: usize,
    keep_first: bool,
    always_remove_output_for_tags: BTreeSet<String>,
    always_keep_output_for_tags: BTreeSet<String>,
}

impl LastNObservations {
    pub fn new(n: i64) -> Result<Self, HistoryError> {
        Self::with_options(
            n,
            1,
            false,
            BTreeSet::from(["remove_output".into()]),
            BTreeSet::from(["keep_output".into()]),
        )
    }

    pub fn with_options(
        n: i64,
        polling: i64,
        keep_first: bool,
        always_remove_output_for_tags: BTreeSet<String>,
        always_keep_output_for_tags: BTreeSet<String>,
    ) -> Result<Self, HistoryError> {
        Ok(Self {
            n: count_param(NAME, "n", n, 1)?,
            polling: count_param(NAME, "polling", polling, 1)?,
            keep_first,
            always_remove_output_for_tags,
            always_keep_output_for_tags,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn polling(&self) -> usize {
        self.polling
    }

    /// Indices (into `history`) of observations whose content is elided
    /// by position alone, before tags are considered.
    fn omitted_indices(&self, history: &[HistoryEntry]) -> HashSet<usize> {
        let observations: Vec<usize> = history
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_observation() && !e.is_demo)
            .map(|(i, _)| i)
            .collect();

        let cutoff = (observations.len() / self.polling * self.polling).saturating_sub(self.n);
        let start = usize::from(self.keep_first);
        observations
            .get(start..cutoff.max(start))
            .unwrap_or_default()
            .iter()
            .copied()
            .collect()
    }

    pub fn apply(&self, history: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
        let omitted = self.omitted_indices(&history);
        history
            .into_iter()
            .enumerate()
            .map(|(i, mut entry)| {
                if !entry.is_observation() {
                    return entry;
                }
                let forced = entry.has_any_tag(&self.always_remove_output_for_tags);
                let kept = entry.has_any_tag(&self.always_keep_output_for_tags);
                if forced || (omitted.contains(&i) && !kept) {
                    entry.content = placeholder(&entry.content);
                }
                entry
            })
            .collect()
    }
}

fn placeholder(content: &str) -> String {
    format!("Old environment output: ({} lines omitted)", content.lines().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::test_helpers::{observation_contents, trajectory};

    fn elided(s: &str) -> bool {
        s.starts_with("Old environment output:")
    }

    #[test]
    fn keeps_exactly_the_last_n_payloads() {
        let history = trajectory(5);
        let out = LastNObservations::new(2).unwrap().apply(history.clone());

        assert_eq!(out.len(), history.len());
        let contents = observation_contents(&out);
        assert_eq!(contents.len(), 5);
        assert_eq!(contents.iter().filter(|c| !elided(c)).count(), 2);
        assert!(contents[..3].iter().all(|c| elided(c)));
        assert_eq!(contents[3], "first line\noutput 3");
        assert_eq!(contents[4], "first line\noutput 4");
        assert_eq!(contents[0], "Old environment output: (2 lines omitted)");

        // Non-observations and ids are untouched
        for (before, after) in history.iter().zip(&out) {
            assert_eq!(before.id, after.id);
            if !before.is_observation() {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn fewer_observations_than_n_is_a_no_op() {
        let history = trajectory(2);
        let out = LastNObservations::new(5).unwrap().apply(history.clone());
        assert_eq!(out, history);
    }

    #[test]
    fn keep_first_protects_the_first_observation() {
        let processor = LastNObservations::with_options(
            2,
            1,
            true,
            BTreeSet::new(),
            BTreeSet::new(),
        )
        .unwrap();
        let out = processor.apply(trajectory(5));
        let contents = observation_contents(&out);
        assert!(!elided(contents[0]));
        assert!(elided(contents[1]) && elided(contents[2]));
        assert!(!elided(contents[3]) && !elided(contents[4]));
    }

    #[test]
    fn polling_moves_cutoff_in_steps() {
        let processor = LastNObservations::with_options(
            1,
            3,
            false,
            BTreeSet::new(),
            BTreeSet::new(),
        )
        .unwrap();

        // 4 observations: floor(4/3)*3 - 1 = 2 elided
        let contents = observation_contents(&processor.apply(trajectory(4)))
            .into_iter()
            .map(elided)
            .collect::<Vec<_>>();
        assert_eq!(contents, vec![true, true, false, false]);

        // 5 observations: still 2 elided
        let contents = observation_contents(&processor.apply(trajectory(5)))
            .into_iter()
            .map(elided)
            .collect::<Vec<_>>();
        assert_eq!(contents, vec![true, true, false, false, false]);
    }

    #[test]
    fn tags_override_position() {
        let mut history = trajectory(4);
        // Observation 0 sits at index 3, observation 3 at index 9
        history[3].tags.insert("keep_output".into());
        history[9].tags.insert("remove_output".into());

        let out = LastNObservations::new(2).unwrap().apply(history);
        let contents = observation_contents(&out);
        assert!(!elided(contents[0]));
        assert!(elided(contents[1]));
        assert!(!elided(contents[2]));
        assert!(elided(contents[3]));
    }

    #[test]
    fn demo_observations_are_not_counted() {
        let mut history = trajectory(3);
        for entry in history.iter_mut().take(5) {
            entry.is_demo = true;
        }
        // Only observations 1 and 2 count; with n = 2 nothing is elided
        let out = LastNObservations::new(2).unwrap().apply(history);
        assert!(observation_contents(&out).iter().all(|c| !elided(c)));
    }

    #[test]
    fn non_positive_n_fails_at_construction() {
        assert!(matches!(
            LastNObservations::new(0),
            Err(HistoryError::InvalidParameter { .. })
        ));
        assert!(LastNObservations::new(-3).is_err());
        assert!(LastNObservations::with_options(2, 0, false, BTreeSet::new(), BTreeSet::new()).is_err());
    }
}
