//! Model completion types.
//!
//! The model collaborator answers `complete(prompt, tools?)` with either
//! text or a single tool call:
//!
//! ```text
//! complete(prompt, None)         → Completion::Text
//! complete(prompt, Some(tools))  → Completion::Text | Completion::ToolCall
//! ```

use crate::tool::entities::ToolCall;
use serde::{Deserialize, Serialize};

/// Answer of one model call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Completion {
    Text { text: String },
    ToolCall { call: ToolCall },
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Completion::Text { text: text.into() }
    }

    pub fn tool_call(call: ToolCall) -> Self {
        Completion::ToolCall { call }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Completion::Text { text } => Some(text),
            Completion::ToolCall { .. } => None,
        }
    }

    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match self {
            Completion::ToolCall { call } => Some(call),
            Completion::Text { .. } => None,
        }
    }

    /// Text content, or the tool call rendered as JSON.
    pub fn into_text(self) -> String {
        match self {
            Completion::Text { text } => text,
            Completion::ToolCall { call } => serde_json::to_string(&call).unwrap_or_default(),
        }
    }
}
