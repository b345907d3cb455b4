//! Model providers.
//!
//! The agent host only talks to [`LlmClient`]; the concrete Gemini client and
//! its HTTP transport live behind it.

pub mod error;
pub mod gemini;
pub mod http;

pub use error::LlmError;
pub use gemini::GeminiClient;

use async_trait::async_trait;
use shared::agent_api::{LlmResponse, Turn};

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One conversation turn: `history` plus a new user turn holding `prompt`.
    ///
    /// Never retries; a failed call is returned as-is.
    async fn generate(&self, prompt: &str, history: &[Turn]) -> Result<LlmResponse, LlmError>;
}
