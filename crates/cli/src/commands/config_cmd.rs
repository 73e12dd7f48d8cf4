//! `agentkit config`: Configuration inspection commands.

use super::{OutputFormat, SourceArgs};
use agentkit_agent::HistoryPipeline;
use agentkit_config::{ConfigLoader, ConfigValue, LoaderEnv, PATH_KEYS};
use std::path::PathBuf;

/// Render any serializable value in the requested format.
pub(crate) fn render<T: serde::Serialize>(
    value: &T,
    format: OutputFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Toml => toml::to_string_pretty(value)?,
    })
}

/// The merged tree with every known path key resolved.
pub(crate) fn effective_tree(loader: ConfigLoader) -> Result<ConfigValue, agentkit_config::ConfigError> {
    PATH_KEYS
        .iter()
        .fold(loader, |loader, key| loader.path_key(*key))
        .load_tree()
}

pub fn show(
    sources: &SourceArgs,
    root: Option<PathBuf>,
    format: OutputFormat,
    typed: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let loader = sources.loader(root)?;
    let rendered = if typed {
        render(&loader.load()?, format)?
    } else {
        render(&effective_tree(loader)?, format)?
    };
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(())
}

pub fn validate(sources: &SourceArgs, root: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    let loader = sources.loader(root)?;
    let config = match loader.load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");
            config
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    };

    let pipeline = match HistoryPipeline::from_configs(&config.agent.history_processors) {
        Ok(pipeline) => {
            println!("   ✅ History processors valid");
            pipeline
        }
        Err(e) => {
            println!("   ❌ History processor error: {e}");
            return Err(e.into());
        }
    };

    let mut warnings = Vec::new();
    if !config.has_api_key() {
        warnings.push("No API key set (set AGENTKIT_API_KEY or agent.model.api_key)".to_string());
    }
    for bundle in &config.agent.tools.bundles {
        if !bundle.path.as_path().exists() {
            warnings.push(format!("Tool bundle not found: {}", bundle.path));
        }
    }
    if config.agent.tools.bundles.is_empty() && !config.agent.tools.enable_bash_tool {
        warnings.push("No tool bundles and the bash tool is disabled".to_string());
    }

    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    let stages: Vec<&str> = pipeline.processors().iter().map(|p| p.name()).collect();
    println!();
    println!("   Root:       {}", loader.root().display());
    println!("   Sources:    {}", sources.configs.len());
    println!("   Agent:      {}", config.agent.name);
    println!("   Model:      {}", config.agent.model.name);
    println!(
        "   Problem:    {} ({})",
        config.problem_statement.kind(),
        config.problem_statement.id().unwrap_or("-")
    );
    println!("   Bundles:    {}", config.agent.tools.bundles.len());
    println!("   History:    {}", stages.join(" → "));
    if let Some(dir) = &config.output_dir {
        println!("   Output dir: {dir}");
    }

    Ok(())
}

pub fn root(root: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let loader = ConfigLoader::from_env(&LoaderEnv::from_process(), root);
    let default = loader.default_source();
    println!("Root:           {}", loader.root().display());
    println!("Config dir:     {}", loader.config_dir().display());
    println!(
        "Default config: {}{}",
        default.display(),
        if default.exists() { "" } else { " (missing)" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_formats() {
        let tree: ConfigValue = serde_yaml::from_str("agent:\n  name: main\n").unwrap();
        assert!(render(&tree, OutputFormat::Yaml).unwrap().contains("name: main"));
        assert!(render(&tree, OutputFormat::Json).unwrap().contains("\"name\": \"main\""));
        assert!(render(&tree, OutputFormat::Toml).unwrap().contains("[agent]"));
    }

    #[test]
    fn effective_tree_resolves_known_paths() {
        let loader = ConfigLoader::new("/repo")
            .with_default(false)
            .set("output_dir=trajectories")
            .unwrap();
        let tree = effective_tree(loader).unwrap();
        assert_eq!(tree["output_dir"].as_str(), Some("/repo/trajectories"));
    }
}
