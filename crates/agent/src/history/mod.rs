//! History processors and the pipeline that chains them.
//!
//! # Processors
//!
//! | `type` | Effect | Count/order |
//! |--------|--------|-------------|
//! | `default` | Pass-through | Unchanged |
//! | `last_n_observations` | Elide content of older observations | Unchanged |
//! | `tag_tool_call_observations` | Tag observations of selected tools | Unchanged |
//! | `cache_control` | Mark newest entries as cache breakpoints | Unchanged |
//! | `remove_regex` | Strip pattern matches from content | Unchanged |
//!
//! No processor drops or reorders entries.

pub mod cache_control;
pub mod last_n;
pub mod pipeline;
pub mod remove_regex;
pub mod tagging;

pub use cache_control::CacheControlHistoryProcessor;
pub use last_n::LastNObservations;
pub use pipeline::{DefaultHistoryProcessor, HistoryPipeline, HistoryProcessor};
pub use remove_regex::RemoveRegex;
pub use tagging::TagToolCallObservations;

#[cfg(test)]
pub(crate) mod test_helpers;

/// Convert a signed config count, rejecting values below `min`.
pub(crate) fn count_param(
    processor: &str,
    name: &str,
    value: i64,
    min: i64,
) -> Result<usize, agentkit_core::HistoryError> {
    if value < min {
        return Err(agentkit_core::HistoryError::invalid(
            processor,
            format!("{name} must be >= {min}, got {value}"),
        ));
    }
    usize::try_from(value).map_err(|_| {
        agentkit_core::HistoryError::invalid(processor, format!("{name} is out of range: {value}"))
    })
}
