//! Ordered turn log replayed to the model as context.

use shared::agent_api::Turn;

/// Append-only history for one chat session.
///
/// Turns are never edited once appended. There is no size cap; `reset` is the
/// only way to shrink it.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh history whose first turn is the system prompt.
    pub fn seeded(system_prompt: &str) -> Self {
        let mut state = Self::new();
        state.reset(system_prompt);
        state
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Drop everything and re-seed with `system_prompt` as a user turn.
    pub fn reset(&mut self, system_prompt: &str) {
        self.turns.clear();
        self.turns.push(Turn::user(system_prompt));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::agent_api::Role;

    #[test]
    fn test_append_preserves_order() {
        let mut state = ConversationState::new();
        state.append(Turn::user("one"));
        state.append(Turn::model("two"));
        state.append(Turn::tool_result("execute_shell_command", "three"));

        let roles: Vec<Role> = state.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Model, Role::ToolResult]);
        assert_eq!(state.last().map(|t| t.role), Some(Role::ToolResult));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut state = ConversationState::seeded("sys");
        for i in 0..50 {
            state.append(Turn::user(format!("msg {}", i)));
        }

        state.reset("sys");
        state.reset("sys");

        assert_eq!(state.len(), 1);
        assert_eq!(state.turns()[0], Turn::user("sys"));
    }

    #[test]
    fn test_no_dedup() {
        let mut state = ConversationState::new();
        state.append(Turn::user("same"));
        state.append(Turn::user("same"));
        assert_eq!(state.len(), 2);
    }
}
