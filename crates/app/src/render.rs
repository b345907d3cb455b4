//! Plain-text rendering of transcript messages.

use chrono::Local;
use shared::events::{DisplayKind, DisplayMessage};

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_message(msg: &DisplayMessage) -> String {
    let time = msg.timestamp.with_timezone(&Local).format("%H:%M");
    match msg.kind {
        DisplayKind::User => format!("[{}] you: {}", time, msg.text),
        DisplayKind::Assistant => format!("[{}] assistant:\n{}", time, indent(&msg.text, "  ")),
        DisplayKind::ToolNotice => format!("[{}] ... {}", time, msg.text),
        DisplayKind::ShellOutput => indent(&msg.text, "  | "),
        DisplayKind::Error => format!("[{}] error: {}", time, msg.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_output_indented() {
        let out = format_message(&DisplayMessage::shell_output("a\nb"));
        assert_eq!(out, "  | a\n  | b");
    }

    #[test]
    fn test_empty_output_placeholder_rendered() {
        let out = format_message(&DisplayMessage::shell_output(""));
        assert_eq!(out, "  | (no output)");
    }

    #[test]
    fn test_error_prefix() {
        let out = format_message(&DisplayMessage::error("boom"));
        assert!(out.ends_with("error: boom"));
    }
}
