//! The agent-side preparation of model queries.
//!
//! Before every query the agent runs its conversation history through the
//! configured history processors:
//!
//! 1. **Declare** processors in `agent.history_processors`
//! 2. **Build** a [`HistoryPipeline`], validating every parameter up front
//! 3. **Apply** the pipeline to the raw history, stage by stage
//! 4. **Send** the processed history to the model client

pub mod history;

pub use history::{
    CacheControlHistoryProcessor, DefaultHistoryProcessor, HistoryPipeline, HistoryProcessor,
    LastNObservations, RemoveRegex, TagToolCallObservations,
};

use agentkit_config::{AppConfig, ConfigLoader};

/// Load the configuration and build its history pipeline.
///
/// Every configuration error, processor parameters included, surfaces
/// here, before any history is processed.
pub fn load_agent(loader: &ConfigLoader) -> agentkit_core::Result<(AppConfig, HistoryPipeline)> {
    let config = loader.load()?;
    let pipeline = HistoryPipeline::from_configs(&config.agent.history_processors)?;
    tracing::debug!(stages = pipeline.len(), "History pipeline ready");
    Ok((config, pipeline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_core::{Error, HistoryError};

    fn loader(processors: &str) -> ConfigLoader {
        ConfigLoader::new("/nonexistent/agentkit-root")
            .with_default(false)
            .set(&format!("agent.history_processors={processors}"))
            .unwrap()
    }

    #[test]
    fn load_agent_builds_the_pipeline() {
        let (config, pipeline) =
            load_agent(&loader("[{type: last_n_observations, n: 3}, {type: cache_control}]")).unwrap();
        assert_eq!(config.agent.history_processors.len(), 2);
        assert_eq!(pipeline.len(), 2);
    }

    #[test]
    fn load_agent_rejects_bad_processor_parameters() {
        let err = load_agent(&loader("[{type: cache_control, last_n_messages: 0}]")).unwrap_err();
        assert!(matches!(
            err,
            Error::History(HistoryError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn load_agent_reports_config_errors_first() {
        let err = load_agent(&loader("[{type: cache_control, last_n_mesages: 0}]")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
