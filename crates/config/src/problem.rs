//! The task the agent is asked to solve.

use crate::paths::ConfigPath;
use crate::value::ConfigValue;
use agentkit_core::ConfigError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Extra template variables carried by a problem statement.
pub type ExtraFields = BTreeMap<String, ConfigValue>;

/// `problem_statement` in configuration.
///
/// When `id` is not given it is derived at load time: a short content hash
/// for text and files, `owner__repo-i<number>` for GitHub issues, and a
/// random UUID for the empty statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ProblemStatementConfig {
    /// No task; the agent starts from its templates alone
    Empty {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Inline task text
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        extra_fields: ExtraFields,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Task text read from a file
    TextFile {
        path: ConfigPath,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        extra_fields: ExtraFields,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// A GitHub issue, fetched by the runner
    Github {
        github_url: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        extra_fields: ExtraFields,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl Default for ProblemStatementConfig {
    fn default() -> Self {
        Self::Empty { id: None }
    }
}

impl ProblemStatementConfig {
    /// Inline text with no extra fields.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            extra_fields: ExtraFields::new(),
            id: None,
        }
    }

    /// The `type` tag of this statement.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty { .. } => "empty",
            Self::Text { .. } => "text",
            Self::TextFile { .. } => "text_file",
            Self::Github { .. } => "github",
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Empty { id }
            | Self::Text { id, .. }
            | Self::TextFile { id, .. }
            | Self::Github { id, .. } => id.as_deref(),
        }
    }

    pub fn extra_fields(&self) -> Option<&ExtraFields> {
        match self {
            Self::Empty { .. } => None,
            Self::Text { extra_fields, .. }
            | Self::TextFile { extra_fields, .. }
            | Self::Github { extra_fields, .. } => Some(extra_fields),
        }
    }

    /// The task text, when it is available without network access.
    ///
    /// GitHub issues return `None`.
    pub fn local_text(&self) -> Result<Option<String>, ConfigError> {
        match self {
            Self::Empty { .. } => Ok(Some(String::new())),
            Self::Text { text, .. } => Ok(Some(text.clone())),
            Self::TextFile { path, .. } => read_statement(path.as_path()).map(Some),
            Self::Github { .. } => Ok(None),
        }
    }

    /// Resolve a relative `text_file` path against `root`.
    pub fn resolve_path(&mut self, root: &Path) {
        if let Self::TextFile { path, .. } = self {
            path.resolve(root);
        }
    }

    /// Fill in a missing `id`.
    pub fn resolve_id(&mut self) -> Result<(), ConfigError> {
        if self.id().is_some() {
            return Ok(());
        }
        let derived = match &*self {
            Self::Empty { .. } => uuid::Uuid::new_v4().to_string(),
            Self::Text { text, .. } => short_hash(text),
            Self::TextFile { path, .. } => short_hash(&read_statement(path.as_path())?),
            Self::Github { github_url, .. } => {
                let (owner, repo, number) =
                    parse_issue_url(github_url).ok_or_else(|| invalid_url(github_url))?;
                format!("{owner}__{repo}-i{number}")
            }
        };
        tracing::debug!(kind = self.kind(), id = %derived, "Derived problem statement id");

        match self {
            Self::Empty { id }
            | Self::Text { id, .. }
            | Self::TextFile { id, .. }
            | Self::Github { id, .. } => *id = Some(derived),
        }
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if let Self::Github { github_url, .. } = self {
            parse_issue_url(github_url).ok_or_else(|| invalid_url(github_url))?;
        }
        Ok(())
    }
}

fn short_hash(text: &str) -> String {
    let mut digest = hex::encode(Sha256::digest(text.as_bytes()));
    digest.truncate(6);
    digest
}

fn read_statement(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn invalid_url(url: &str) -> ConfigError {
    ConfigError::Validation(format!(
        "problem_statement.github_url '{url}' is not a GitHub issue URL"
    ))
}

/// Split `https://github.com/<owner>/<repo>/issues/<number>`.
fn parse_issue_url(url: &str) -> Option<(&str, &str, u64)> {
    let rest = url.trim().trim_end_matches('/');
    let rest = rest
        .strip_prefix("https://")
        .or_else(|| rest.strip_prefix("http://"))
        .unwrap_or(rest);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);

    let mut parts = rest.strip_prefix("github.com/")?.split('/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let repo = parts.next().filter(|s| !s.is_empty())?;
    if parts.next()? != "issues" {
        return None;
    }
    let number = parts.next()?.parse().ok()?;
    match parts.next() {
        None => Some((owner, repo, number)),
        Some(_) => None,
    }
}
