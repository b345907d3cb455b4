//! The chat loop: ask the model, maybe run a tool, ask again.
//!
//! A user message either runs directly as a shell command (prefix marker) or
//! starts a sequence of model queries. Each query yields text, which ends the
//! sequence, or a tool call, which is dispatched, reported back to the model as
//! a tool-result turn and followed by exactly one more query.

use crate::conversation::ConversationState;
use crate::executor::CommandRunner;
use crate::prompts::{default_system_prompt, tool_notice, CONTINUATION_PROMPT};
use crate::tools::ToolRegistry;
use providers::{LlmClient, LlmError};
use shared::agent_api::{LlmResponse, ToolCallRequest, Turn};
use shared::events::DisplayMessage;
use shared::settings::AppSettings;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Stopped after {limit} model queries without a final answer")]
    HopLimitExceeded { limit: usize },

    #[error("Chat session is no longer running")]
    SessionClosed,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Seed turn for new chats; `None` starts from an empty history.
    pub system_prompt: Option<String>,
    pub command_prefix: String,
    /// At least one query is always allowed.
    pub max_tool_hops: usize,
}

impl SessionConfig {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            system_prompt: Some(
                settings
                    .system_prompt
                    .clone()
                    .unwrap_or_else(default_system_prompt),
            ),
            command_prefix: settings.command_prefix.clone(),
            max_tool_hops: settings.max_tool_hops,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            command_prefix: "!".into(),
            max_tool_hops: 10,
        }
    }
}

/// One chat: owns its history exclusively.
pub struct ChatSession {
    state: ConversationState,
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    runner: Arc<dyn CommandRunner>,
    display: UnboundedSender<DisplayMessage>,
    config: SessionConfig,
}

impl ChatSession {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        runner: Arc<dyn CommandRunner>,
        tools: ToolRegistry,
        display: UnboundedSender<DisplayMessage>,
        config: SessionConfig,
    ) -> Self {
        let state = match &config.system_prompt {
            Some(prompt) => ConversationState::seeded(prompt),
            None => ConversationState::new(),
        };
        Self {
            state,
            llm,
            tools,
            runner,
            display,
            config,
        }
    }

    pub fn history(&self) -> &[Turn] {
        self.state.turns()
    }

    /// Start a new chat.
    pub fn reset(&mut self) {
        match &self.config.system_prompt {
            Some(prompt) => self.state.reset(prompt),
            None => self.state = ConversationState::new(),
        }
        tracing::info!("chat reset");
    }

    /// Handle one user message to completion.
    ///
    /// Every failure is also shown in the transcript before it is returned.
    pub async fn process_message(&mut self, text: &str) -> Result<(), ChatError> {
        self.emit(DisplayMessage::user(text));

        let prefix = self.config.command_prefix.as_str();
        if !prefix.is_empty() {
            if let Some(command) = text.strip_prefix(prefix) {
                // Direct commands never enter the model's history.
                let command = command.trim().to_string();
                self.run_direct(&command).await;
                return Ok(());
            }
        }

        self.state.append(Turn::user(text));
        self.query_loop(text).await
    }

    async fn run_direct(&self, command: &str) {
        tracing::info!(command, "running direct command");
        match self.runner.execute(command).await {
            Ok(output) => self.emit(DisplayMessage::shell_output(&output)),
            Err(e) => self.emit(DisplayMessage::error(format!("Error: {}", e))),
        }
    }

    async fn query_loop(&mut self, first_prompt: &str) -> Result<(), ChatError> {
        let limit = self.config.max_tool_hops.max(1);
        let mut prompt = first_prompt.to_string();
        // The first prompt is already the last history turn; don't send it twice.
        let mut context_len = self.state.len() - 1;
        let mut hops = 0;

        loop {
            if hops >= limit {
                let err = ChatError::HopLimitExceeded { limit };
                tracing::warn!(limit, "tool hop limit reached");
                self.emit(DisplayMessage::error(err.to_string()));
                return Err(err);
            }
            hops += 1;

            let context = &self.state.turns()[..context_len];
            let response = match self.llm.generate(&prompt, context).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(error = %e, hop = hops, "model query failed");
                    self.emit(DisplayMessage::error(e.user_message()));
                    return Err(e.into());
                }
            };

            match response {
                LlmResponse::Text(text) => {
                    self.state.append(Turn::model(text.clone()));
                    self.emit(DisplayMessage::assistant(text));
                    return Ok(());
                }
                LlmResponse::ToolCall(call) => {
                    self.emit(DisplayMessage::tool_notice(tool_notice(&call.name)));
                    let turn = self.dispatch(&call).await;
                    self.state.append(turn);
                    prompt = CONTINUATION_PROMPT.to_string();
                    context_len = self.state.len();
                }
            }
        }
    }

    /// Run a requested tool. The model always gets a tool-result turn back.
    async fn dispatch(&self, call: &ToolCallRequest) -> Turn {
        tracing::info!(tool = %call.name, "dispatching tool call");
        match self.tools.dispatch(call).await {
            Ok(output) => {
                self.emit(DisplayMessage::shell_output(&output));
                Turn::tool_result(&call.name, output)
            }
            Err(e) if e.is_validation() => {
                tracing::warn!(tool = %call.name, error = %e, "rejected tool call");
                self.emit(DisplayMessage::error(format!(
                    "Unknown tool or invalid arguments: {}",
                    e
                )));
                Turn::tool_error(&call.name, e.to_string())
            }
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "tool failed");
                self.emit(DisplayMessage::error(format!("Error: {}", e)));
                Turn::tool_error(&call.name, e.to_string())
            }
        }
    }

    fn emit(&self, msg: DisplayMessage) {
        // Ignore send errors (renderer may have gone away)
        let _ = self.display.send(msg);
    }
}
