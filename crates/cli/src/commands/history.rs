//! `agentkit history`: History processor commands.

use super::SourceArgs;
use agentkit_agent::{HistoryPipeline, HistoryProcessor, load_agent};
use agentkit_core::HistoryEntry;
use std::path::{Path, PathBuf};

fn build_pipeline(
    sources: &SourceArgs,
    root: Option<PathBuf>,
) -> Result<HistoryPipeline, Box<dyn std::error::Error>> {
    let (_, pipeline) = load_agent(&sources.loader(root)?)?;
    Ok(pipeline)
}

pub fn check(sources: &SourceArgs, root: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = build_pipeline(sources, root)?;

    println!("📜 History processors ({})", pipeline.len());
    if pipeline.is_empty() {
        println!("   (none, history is sent unchanged)");
    }
    for (i, processor) in pipeline.processors().iter().enumerate() {
        println!("   {}. {}", i + 1, describe(processor));
    }
    Ok(())
}

fn describe(processor: &HistoryProcessor) -> String {
    match processor {
        HistoryProcessor::LastNObservations(p) => {
            format!("{} (n = {}, polling = {})", processor.name(), p.n(), p.polling())
        }
        HistoryProcessor::CacheControl(p) => {
            format!("{} (last_n_messages = {})", processor.name(), p.last_n_messages())
        }
        _ => processor.name().to_string(),
    }
}

/// Parse a JSON array of entries.
pub(crate) fn read_history(path: &Path) -> Result<Vec<HistoryEntry>, agentkit_core::Error> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn apply(
    sources: &SourceArgs,
    root: Option<PathBuf>,
    input: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = build_pipeline(sources, root)?;
    let history = read_history(input)?;
    let entries = history.len();

    let processed = pipeline.apply(history);
    let json = serde_json::to_string_pretty(&processed)?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))?;
            tracing::info!(entries, output = %path.display(), "History written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
