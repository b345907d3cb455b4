use crate::http::HttpError;

/// Longest slice of a failed response body kept for diagnostics.
const MAX_ERROR_BODY: usize = 800;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("could not reach the model endpoint: {0}")]
    Transport(String),

    #[error("model API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected response from model API: {0}")]
    Decoding(String),

    #[error("model request failed: {0}")]
    Unknown(String),
}

impl LlmError {
    pub fn api(status: u16, body: &str) -> Self {
        let body = body.trim();
        let body = if body.chars().count() > MAX_ERROR_BODY {
            format!("{}...", body.chars().take(MAX_ERROR_BODY).collect::<String>())
        } else {
            body.to_string()
        };
        LlmError::Api { status, body }
    }

    /// Friendly text for the transcript, picked by failure kind.
    pub fn user_message(&self) -> String {
        match self {
            LlmError::Transport(e) => format!(
                "I'm having trouble connecting to the AI service. Please check your network connection.\n\nError: {}",
                e
            ),
            LlmError::Api { status: 401 | 403, body } => format!(
                "I couldn't connect to the AI service - there may be an issue with the API key.\n\nError: {}",
                body
            ),
            LlmError::Api { status: 429, body } => format!(
                "The AI service is temporarily busy. Please wait a moment and try again.\n\nError: {}",
                body
            ),
            LlmError::Api { status, body } if body.is_empty() => {
                format!("The AI service returned an error (HTTP {}).", status)
            }
            LlmError::Api { status, body } => format!(
                "The AI service returned an error (HTTP {}).\n\n{}",
                status, body
            ),
            LlmError::Decoding(e) => format!(
                "The AI service sent a reply I couldn't understand.\n\nError: {}",
                e
            ),
            LlmError::Unknown(e) => format!(
                "Sorry, I ran into an issue. Here's what happened:\n\n{}",
                e
            ),
        }
    }
}

impl From<HttpError> for LlmError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Connect(e) => LlmError::Transport(e),
            HttpError::Other(e) => LlmError::Unknown(e),
        }
    }
}
