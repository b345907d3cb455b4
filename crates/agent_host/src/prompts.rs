//! Fixed prompt text used by the chat loop.

/// Sent as the next query after every tool result so the model can comment
/// on the output or ask for another tool.
pub const CONTINUATION_PROMPT: &str = "continue";

/// System prompt seeded into every new chat (cross-platform aware)
pub fn default_system_prompt() -> String {
    let os_context = if cfg!(windows) {
        r#"## Your Environment
- You are running on WINDOWS
- Use Windows commands: dir, type, where, systeminfo, ipconfig, etc.
- Use PowerShell for advanced tasks"#
    } else {
        r#"## Your Environment
- You are running on Linux/macOS
- Use Unix commands: ls, cat, grep, find, etc."#
    };

    format!(
        r#"You are a helpful assistant living in the user's menu bar.

## Your Capabilities
- You can run shell commands on the user's computer with the execute_shell_command tool
- Command output is returned to you; summarize it in plain language

{}

## Safety Rules
- NEVER run destructive commands unless the user explicitly asked for them
- If a command fails, explain what happened and suggest alternatives

## Response Style
- Be concise and conversational
"#,
        os_context
    )
}

/// Transcript line shown while a tool call is dispatched.
pub fn tool_notice(tool_name: &str) -> String {
    format!("Executing tool: {}", tool_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_mentions_tool() {
        assert!(default_system_prompt().contains("execute_shell_command"));
    }

    #[test]
    fn test_tool_notice() {
        assert_eq!(
            tool_notice("execute_shell_command"),
            "Executing tool: execute_shell_command"
        );
    }
}
