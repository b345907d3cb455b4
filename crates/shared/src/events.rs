//! Display events for the chat transcript.
//!
//! These are a rendering-only projection of what happened during a chat. They
//! never flow back into the model history, so what the user sees and what the
//! model is told can differ (e.g. empty shell output).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shown in place of empty shell output. The model still receives `""`.
pub const EMPTY_OUTPUT_PLACEHOLDER: &str = "(no output)";

/// What kind of line the transcript should render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayKind {
    /// Echo of what the user typed
    User,
    /// Model text reply
    Assistant,
    /// Status line while a tool runs
    ToolNotice,
    /// Captured command output
    ShellOutput,
    /// Any failure surfaced to the user
    Error,
}

/// A single entry in the rendered message list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayMessage {
    /// Unique message ID
    pub id: Uuid,
    /// When the message was produced
    pub timestamp: DateTime<Utc>,
    pub kind: DisplayKind,
    pub text: String,
}

impl DisplayMessage {
    fn new(kind: DisplayKind, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(DisplayKind::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(DisplayKind::Assistant, text)
    }

    pub fn tool_notice(text: impl Into<String>) -> Self {
        Self::new(DisplayKind::ToolNotice, text)
    }

    /// Shell output, with the placeholder substituted for blank output.
    pub fn shell_output(output: &str) -> Self {
        if output.trim().is_empty() {
            Self::new(DisplayKind::ShellOutput, EMPTY_OUTPUT_PLACEHOLDER)
        } else {
            Self::new(DisplayKind::ShellOutput, output)
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(DisplayKind::Error, text)
    }

    pub fn is_error(&self) -> bool {
        self.kind == DisplayKind::Error
    }
}
