//! # agentkit Core
//!
//! Domain types and error definitions shared by every agentkit crate.
//! The conversation model (`HistoryEntry` and friends) and the bounded
//! context errors live here so that the config and agent crates can
//! depend inward on a single vocabulary.

pub mod error;
pub mod message;

// Re-export key types at crate root for ergonomics
pub use error::{ConfigError, Error, HistoryError, Result};
pub use message::{CacheControl, HistoryEntry, MessageType, Role, ToolCall};
