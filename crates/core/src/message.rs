//! History entry domain types.
//!
//! A history is an ordered `Vec<HistoryEntry>`: the transcript an agent
//! sends to the model on every query. History processors rewrite entries
//! in place but never reorder them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The end user or the task template
    User,
    /// The model
    Assistant,
    /// Tool execution result
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        f.write_str(s)
    }
}

/// What an entry represents in the agent's trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    System,
    User,
    /// A model turn that (usually) invokes a tool
    Action,
    /// Output of the environment in response to an action
    Observation,
    /// Part of a demonstration trajectory shown to the model
    Demonstration,
}

/// A tool call embedded in an assistant entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as JSON string
    #[serde(default)]
    pub arguments: String,
}

/// Prompt-caching breakpoint understood by model clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheControl {
    #[serde(rename = "type")]
    pub kind: String,
}

impl CacheControl {
    pub fn ephemeral() -> Self {
        Self {
            kind: "ephemeral".into(),
        }
    }
}

fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

/// A single turn of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique entry ID
    #[serde(default = "new_entry_id")]
    pub id: String,

    /// Who produced this entry
    pub role: Role,

    /// The text content
    #[serde(default)]
    pub content: String,

    /// Explicit trajectory kind; derived from the role when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageType>,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Markers consumed by history processors (e.g. `keep_output`)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    /// Cache breakpoint placed by the cache-control processor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,

    /// Whether this entry belongs to a demonstration
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_demo: bool,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Optional metadata (token usage, provider info, etc.)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl HistoryEntry {
    /// Create an entry with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_entry_id(),
            role,
            content: content.into(),
            message_type: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
            tags: BTreeSet::new(),
            cache_control: None,
            is_demo: false,
            timestamp: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Create a new system entry.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a new user entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant entry.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant entry that invokes the given tools.
    pub fn action(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Create a tool result entry.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(Role::Tool, content)
        }
    }

    /// Set an explicit message type.
    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = Some(message_type);
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// The explicit message type, or the one implied by the role.
    pub fn kind(&self) -> MessageType {
        self.message_type.unwrap_or(match self.role {
            Role::System => MessageType::System,
            Role::User => MessageType::User,
            Role::Assistant => MessageType::Action,
            Role::Tool => MessageType::Observation,
        })
    }

    /// Whether this entry is environment output.
    pub fn is_observation(&self) -> bool {
        self.kind() == MessageType::Observation
    }

    /// Whether any of `tags` is set on this entry.
    pub fn has_any_tag<'a>(&self, tags: impl IntoIterator<Item = &'a String>) -> bool {
        tags.into_iter().any(|t| self.tags.contains(t))
    }
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_derives_from_role() {
        assert_eq!(HistoryEntry::user("hi").kind(), MessageType::User);
        assert_eq!(HistoryEntry::assistant("ok").kind(), MessageType::Action);
        assert!(HistoryEntry::tool_result("c1", "out").is_observation());
    }

    #[test]
    fn explicit_type_wins() {
        let entry = HistoryEntry::user("template").with_type(MessageType::Observation);
        assert!(entry.is_observation());
        assert_eq!(entry.role, Role::User);
    }

    #[test]
    fn deserializes_minimal_entry() {
        let entry: HistoryEntry =
            serde_json::from_str(r#"{"role": "tool", "content": "ls output", "tool_call_id": "c1"}"#)
                .unwrap();
        assert_eq!(entry.role, Role::Tool);
        assert_eq!(entry.tool_call_id.as_deref(), Some("c1"));
        assert!(!entry.id.is_empty());
        assert!(entry.tags.is_empty());
    }

    #[test]
    fn cache_control_serializes_type_key() {
        let mut entry = HistoryEntry::user("hello");
        entry.cache_control = Some(CacheControl::ephemeral());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["cache_control"]["type"], "ephemeral");
        assert!(json.get("tags").is_none());
        assert!(json.get("is_demo").is_none());
    }
}
