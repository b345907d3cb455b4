//! Tool capability types shared by the model client and the agent host.
//!
//! A tool is anything the model may invoke by name with structured arguments.
//! The agent host looks tools up in a registry, so adding one never touches the
//! conversation loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tool failure taxonomy.
///
/// `UnknownTool` and `InvalidArguments` are validation failures raised before
/// anything runs; the rest are execution failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Could not launch command: {0}")]
    LaunchFailed(String),

    #[error("Command exited with status {code}: {output}")]
    NonZeroExit { code: i32, output: String },

    #[error("Command timed out after {secs}s")]
    TimedOut { secs: u64 },
}

impl ToolError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ToolError::UnknownTool { .. } | ToolError::InvalidArguments { .. }
        )
    }
}

/// Loosely-typed arguments as sent by the model, with strict extraction.
///
/// Nothing is coerced: a number where a string is expected is an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs {
    tool: String,
    values: Map<String, Value>,
}

impl ToolArgs {
    pub fn new(tool: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            values,
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    fn invalid(&self, message: String) -> ToolError {
        ToolError::InvalidArguments {
            tool: self.tool.clone(),
            message,
        }
    }

    fn require(&self, key: &str) -> Result<&Value, ToolError> {
        self.values
            .get(key)
            .ok_or_else(|| self.invalid(format!("missing required argument '{}'", key)))
    }

    pub fn require_str(&self, key: &str) -> Result<&str, ToolError> {
        match self.require(key)? {
            Value::String(s) => Ok(s),
            other => Err(self.invalid(format!(
                "argument '{}' must be a string, got {}",
                key,
                type_name(other)
            ))),
        }
    }

    pub fn optional_str(&self, key: &str) -> Result<Option<&str>, ToolError> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(self.invalid(format!(
                "argument '{}' must be a string, got {}",
                key,
                type_name(other)
            ))),
        }
    }

    pub fn require_bool(&self, key: &str) -> Result<bool, ToolError> {
        match self.require(key)? {
            Value::Bool(b) => Ok(*b),
            other => Err(self.invalid(format!(
                "argument '{}' must be a boolean, got {}",
                key,
                type_name(other)
            ))),
        }
    }

    pub fn require_i64(&self, key: &str) -> Result<i64, ToolError> {
        let value = self.require(key)?;
        value.as_i64().ok_or_else(|| {
            self.invalid(format!(
                "argument '{}' must be an integer, got {}",
                key,
                type_name(value)
            ))
        })
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Schema advertised to the model for one tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON-schema object describing the arguments
    pub parameters: Value,
}

/// Core tool trait that every model-invocable capability implements
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model calls the tool by (snake_case)
    fn name(&self) -> &'static str;

    /// Description shown to the model
    fn description(&self) -> &'static str;

    /// JSON-schema for the arguments
    fn parameters_schema(&self) -> Value;

    /// Run the tool. Returns the text handed back to the model.
    async fn invoke(&self, args: &ToolArgs) -> Result<String, ToolError>;

    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}
