//! Agent Host - chat orchestration with shell tool calling
//!
//! This crate provides the chat loop that:
//! - Relays user messages to the model with the accumulated history
//! - Runs model-requested tools and feeds their results back
//! - Runs `!`-prefixed messages directly as shell commands
//! - Serializes all work for one chat through a single task

pub mod actor;
pub mod conversation;
pub mod executor;
pub mod prompts;
pub mod session;
pub mod tools;

pub use actor::SessionHandle;
pub use conversation::ConversationState;
pub use executor::{CommandRunner, ShellRunner};
pub use prompts::{default_system_prompt, CONTINUATION_PROMPT};
pub use session::{ChatError, ChatSession, SessionConfig};
pub use tools::{ShellCommandTool, ToolRegistry, SHELL_TOOL_NAME};

use anyhow::Result;
use providers::GeminiClient;
use shared::events::DisplayMessage;
use shared::settings::AppSettings;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Wires the production collaborators together from settings
pub struct AgentHost {
    pub settings: AppSettings,
}

impl AgentHost {
    pub fn new(settings: AppSettings) -> Self {
        Self { settings }
    }

    /// Shell runner honoring the configured command timeout.
    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        let timeout = self.settings.command_timeout_secs.map(Duration::from_secs);
        Arc::new(ShellRunner::new().with_timeout(timeout))
    }

    /// Build a Gemini-backed session without starting it.
    pub fn build_session(&self, display: UnboundedSender<DisplayMessage>) -> Result<ChatSession> {
        let runner = self.runner();
        let tools = ToolRegistry::with_shell(runner.clone());
        let llm = GeminiClient::from_settings(&self.settings.model, tools.declarations())?;
        tracing::info!(
            model = %self.settings.model.gemini_model,
            tools = tools.len(),
            "chat session ready"
        );
        Ok(ChatSession::new(
            Arc::new(llm),
            runner,
            tools,
            display,
            SessionConfig::from_settings(&self.settings),
        ))
    }

    /// Build a session and move it onto its own task.
    pub fn start(&self, display: UnboundedSender<DisplayMessage>) -> Result<SessionHandle> {
        Ok(SessionHandle::spawn(self.build_session(display)?))
    }
}
