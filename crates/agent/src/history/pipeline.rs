//! Building and running the history processor pipeline.
//!
//! Every declaration is validated when the pipeline is built, so a bad
//! parameter aborts startup instead of surfacing on the first model query.
//! Running the pipeline is a strict left-to-right fold over the stages.

use super::{CacheControlHistoryProcessor, LastNObservations, RemoveRegex, TagToolCallObservations};
use agentkit_config::HistoryProcessorConfig;
use agentkit_core::{HistoryEntry, HistoryError};

// ── Processors ────────────────────────────────────────────────────────────

/// The identity processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultHistoryProcessor;

impl DefaultHistoryProcessor {
    pub fn apply(&self, history: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
        history
    }
}

/// A validated history processor.
#[derive(Debug, Clone)]
pub enum HistoryProcessor {
    Default(DefaultHistoryProcessor),
    LastNObservations(LastNObservations),
    TagToolCallObservations(TagToolCallObservations),
    CacheControl(CacheControlHistoryProcessor),
    RemoveRegex(RemoveRegex),
}

impl HistoryProcessor {
    /// Validate a declaration.
    pub fn from_config(config: &HistoryProcessorConfig) -> Result<Self, HistoryError> {
        let processor = match config {
            HistoryProcessorConfig::Default => Self::Default(DefaultHistoryProcessor),
            HistoryProcessorConfig::LastNObservations {
                n,
                polling,
                keep_first,
                always_remove_output_for_tags,
                always_keep_output_for_tags,
            } => Self::LastNObservations(LastNObservations::with_options(
                *n,
                *polling,
                *keep_first,
                always_remove_output_for_tags.clone(),
                always_keep_output_for_tags.clone(),
            )?),
            HistoryProcessorConfig::TagToolCallObservations {
                tags,
                function_names,
            } => Self::TagToolCallObservations(TagToolCallObservations::new(
                tags.clone(),
                function_names.clone(),
            )?),
            HistoryProcessorConfig::CacheControl {
                last_n_messages,
                last_n_messages_offset,
                tagged_roles,
            } => Self::CacheControl(CacheControlHistoryProcessor::new(
                *last_n_messages,
                *last_n_messages_offset,
                tagged_roles.clone(),
            )?),
            HistoryProcessorConfig::RemoveRegex { remove, keep_last } => {
                Self::RemoveRegex(RemoveRegex::new(remove.as_slice(), *keep_last)?)
            }
        };
        Ok(processor)
    }

    /// The `type` tag this processor is declared with.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default(_) => "default",
            Self::LastNObservations(_) => "last_n_observations",
            Self::TagToolCallObservations(_) => "tag_tool_call_observations",
            Self::CacheControl(_) => "cache_control",
            Self::RemoveRegex(_) => "remove_regex",
        }
    }

    /// Whether this stage may change entry content.
    pub fn rewrites_content(&self) -> bool {
        matches!(self, Self::LastNObservations(_) | Self::RemoveRegex(_))
    }

    pub fn apply(&self, history: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
        match self {
            Self::Default(p) => p.apply(history),
            Self::LastNObservations(p) => p.apply(history),
            Self::TagToolCallObservations(p) => p.apply(history),
            Self::CacheControl(p) => p.apply(history),
            Self::RemoveRegex(p) => p.apply(history),
        }
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────

/// An ordered chain of validated processors.
#[derive(Debug, Clone, Default)]
pub struct HistoryPipeline {
    processors: Vec<HistoryProcessor>,
}

impl HistoryPipeline {
    /// Validate every declaration and check the stage ordering.
    ///
    /// A content-rewriting stage after `cache_control` is rejected: it would
    /// change content under a breakpoint that was already placed.
    pub fn from_configs(configs: &[HistoryProcessorConfig]) -> Result<Self, HistoryError> {
        let processors = configs
            .iter()
            .map(HistoryProcessor::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(processors)
    }

    pub fn new(processors: Vec<HistoryProcessor>) -> Result<Self, HistoryError> {
        if let Some(cache_at) = processors
            .iter()
            .position(|p| matches!(p, HistoryProcessor::CacheControl(_)))
        {
            if let Some(late) = processors[cache_at + 1..].iter().find(|p| p.rewrites_content()) {
                return Err(HistoryError::ReferentialHazard(format!(
                    "{} runs after cache_control and would rewrite content under placed breakpoints; \
                     move cache_control to the end of history_processors",
                    late.name()
                )));
            }

            let churning = processors.iter().any(|p| {
                matches!(p, HistoryProcessor::LastNObservations(l) if l.polling() == 1)
            });
            if churning {
                tracing::warn!(
                    "last_n_observations with polling = 1 changes the elided prefix on every \
                     query, which defeats prompt caching; consider a larger polling value"
                );
            }
        }

        Ok(Self { processors })
    }

    pub fn processors(&self) -> &[HistoryProcessor] {
        &self.processors
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Run `history` through every stage in order.
    pub fn apply(&self, history: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
        self.processors.iter().fold(history, |history, processor| {
            let before = history.len();
            let out = processor.apply(history);
            tracing::debug!(
                processor = processor.name(),
                entries = out.len(),
                "Applied history processor"
            );
            debug_assert_eq!(before, out.len(), "history processors never drop entries");
            out
        })
    }
}
