pub mod events;
pub mod tool;

pub mod settings {
    use serde::{Deserialize, Serialize};
    use std::env;
    use std::path::Path;

    pub const DEFAULT_GEMINI_ENDPOINT: &str =
        "https://generativelanguage.googleapis.com/v1beta/models";

    fn default_gemini_model() -> String {
        "gemini-1.5-flash".into()
    }

    fn default_endpoint() -> String {
        DEFAULT_GEMINI_ENDPOINT.into()
    }

    fn default_request_timeout() -> u64 {
        60
    }

    fn default_command_prefix() -> String {
        "!".into()
    }

    fn default_max_tool_hops() -> usize {
        10
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ProviderAuth {
        pub api_key: Option<String>,
    }

    impl ProviderAuth {
        /// Configured key, falling back to `env_var`. Blank values count as unset.
        pub fn resolve(&self, env_var: &str) -> Option<String> {
            self.api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .or_else(|| env::var(env_var).ok().filter(|k| !k.trim().is_empty()))
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ModelSettings {
        #[serde(default = "default_gemini_model")]
        pub gemini_model: String, // e.g., "gemini-1.5-flash"
        #[serde(default)]
        pub gemini_auth: ProviderAuth,
        #[serde(default = "default_endpoint")]
        pub endpoint_base: String,
        #[serde(default = "default_request_timeout")]
        pub request_timeout_secs: u64,
    }

    impl Default for ModelSettings {
        fn default() -> Self {
            Self {
                gemini_model: default_gemini_model(),
                gemini_auth: ProviderAuth::default(),
                endpoint_base: default_endpoint(),
                request_timeout_secs: default_request_timeout(),
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AppSettings {
        #[serde(default)]
        pub model: ModelSettings,
        /// Seed turn for every new chat. `None` uses the built-in prompt.
        #[serde(default)]
        pub system_prompt: Option<String>,
        /// Lines starting with this marker run locally and skip the model.
        #[serde(default = "default_command_prefix")]
        pub command_prefix: String,
        /// No timeout when unset.
        #[serde(default)]
        pub command_timeout_secs: Option<u64>,
        /// Upper bound on model queries for a single user message.
        #[serde(default = "default_max_tool_hops")]
        pub max_tool_hops: usize,
    }

    impl Default for AppSettings {
        fn default() -> Self {
            Self {
                model: ModelSettings::default(),
                system_prompt: None,
                command_prefix: default_command_prefix(),
                command_timeout_secs: None,
                max_tool_hops: default_max_tool_hops(),
            }
        }
    }

    #[derive(Debug, thiserror::Error)]
    pub enum SettingsError {
        #[error("failed to read {path}: {source}")]
        Io {
            path: String,
            #[source]
            source: std::io::Error,
        },
        #[error("invalid settings in {path}: {source}")]
        Parse {
            path: String,
            #[source]
            source: serde_json::Error,
        },
    }

    impl AppSettings {
        pub fn from_json_file(path: &Path) -> Result<Self, SettingsError> {
            let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
                path: path.display().to_string(),
                source,
            })?;
            serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
                path: path.display().to_string(),
                source,
            })
        }
    }

}

pub mod agent_api {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        User,
        Model,
        ToolResult,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ToolOutcome {
        Result(String),
        Error(String),
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ToolResultPayload {
        pub name: String,
        pub outcome: ToolOutcome,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TurnContent {
        Text(String),
        ToolResult(ToolResultPayload),
    }

    /// One entry of the history replayed to the model on every query.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Turn {
        pub role: Role,
        pub content: TurnContent,
    }

    impl Turn {
        pub fn user(text: impl Into<String>) -> Self {
            Self {
                role: Role::User,
                content: TurnContent::Text(text.into()),
            }
        }

        pub fn model(text: impl Into<String>) -> Self {
            Self {
                role: Role::Model,
                content: TurnContent::Text(text.into()),
            }
        }

        pub fn tool_result(name: impl Into<String>, result: impl Into<String>) -> Self {
            Self {
                role: Role::ToolResult,
                content: TurnContent::ToolResult(ToolResultPayload {
                    name: name.into(),
                    outcome: ToolOutcome::Result(result.into()),
                }),
            }
        }

        pub fn tool_error(name: impl Into<String>, error: impl Into<String>) -> Self {
            Self {
                role: Role::ToolResult,
                content: TurnContent::ToolResult(ToolResultPayload {
                    name: name.into(),
                    outcome: ToolOutcome::Error(error.into()),
                }),
            }
        }

        pub fn text(&self) -> Option<&str> {
            match &self.content {
                TurnContent::Text(t) => Some(t),
                TurnContent::ToolResult(_) => None,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ToolCallRequest {
        pub name: String,
        pub args: serde_json::Map<String, serde_json::Value>,
    }

    /// Exactly one of these per model turn.
    #[derive(Debug, Clone, PartialEq)]
    pub enum LlmResponse {
        Text(String),
        ToolCall(ToolCallRequest),
    }
}
