//! Model-invocable tools and the registry the chat loop dispatches through.

use crate::executor::CommandRunner;
use async_trait::async_trait;
use serde_json::{json, Value};
use shared::agent_api::ToolCallRequest;
use shared::tool::{Tool, ToolArgs, ToolDeclaration, ToolError};
use std::collections::HashMap;
use std::sync::Arc;

pub const SHELL_TOOL_NAME: &str = "execute_shell_command";

/// Runs a shell command on the user's machine on the model's behalf
pub struct ShellCommandTool {
    runner: Arc<dyn CommandRunner>,
}

impl ShellCommandTool {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Tool for ShellCommandTool {
    fn name(&self) -> &'static str {
        SHELL_TOOL_NAME
    }

    fn description(&self) -> &'static str {
        "Executes a shell command on the user's computer and returns its combined output."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    async fn invoke(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let command = args.require_str("command")?;
        self.runner.execute(command).await
    }
}

/// Name-indexed set of tools offered to the model
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// The default tool set: just the shell tool.
    pub fn with_shell(runner: Arc<dyn CommandRunner>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ShellCommandTool::new(runner)));
        registry
    }

    /// Register a tool, replacing any with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Schemas for the model request, sorted by name.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        let mut decls: Vec<ToolDeclaration> =
            self.tools.values().map(|t| t.declaration()).collect();
        decls.sort_by(|a, b| a.name.cmp(&b.name));
        decls
    }

    /// Look up the requested tool and run it.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> Result<String, ToolError> {
        let tool = self.get(&call.name).ok_or_else(|| ToolError::UnknownTool {
            name: call.name.clone(),
        })?;
        let args = ToolArgs::new(call.name.clone(), call.args.clone());
        tool.invoke(&args).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingRunner {
        commands: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn execute(&self, command: &str) -> Result<String, ToolError> {
            self.commands.lock().push(command.to_string());
            Ok(format!("ran {}", command))
        }
    }

    fn call(name: &str, args: Value) -> ToolCallRequest {
        ToolCallRequest {
            name: name.to_string(),
            args: args.as_object().cloned().unwrap_or_default(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_shell() {
        let runner = Arc::new(RecordingRunner::default());
        let registry = ToolRegistry::with_shell(runner.clone());

        let out = registry
            .dispatch(&call(SHELL_TOOL_NAME, json!({"command": "echo hi"})))
            .await
            .unwrap();
        assert_eq!(out, "ran echo hi");
        assert_eq!(*runner.commands.lock(), vec!["echo hi".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_tool_never_runs() {
        let runner = Arc::new(RecordingRunner::default());
        let registry = ToolRegistry::with_shell(runner.clone());

        let err = registry
            .dispatch(&call("delete_everything", json!({})))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::UnknownTool {
                name: "delete_everything".into()
            }
        );
        assert!(runner.commands.lock().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_arguments_never_run() {
        let runner = Arc::new(RecordingRunner::default());
        let registry = ToolRegistry::with_shell(runner.clone());

        for args in [json!({}), json!({"command": 42}), json!({"cmd": "ls"})] {
            let err = registry
                .dispatch(&call(SHELL_TOOL_NAME, args))
                .await
                .unwrap_err();
            assert!(err.is_validation());
        }
        assert!(runner.commands.lock().is_empty());
    }

    #[test]
    fn test_declarations() {
        let registry = ToolRegistry::with_shell(Arc::new(RecordingRunner::default()));
        let decls = registry.declarations();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, SHELL_TOOL_NAME);
        assert_eq!(decls[0].parameters["properties"]["command"]["type"], "string");
        assert_eq!(decls[0].parameters["required"], json!(["command"]));
    }
}
