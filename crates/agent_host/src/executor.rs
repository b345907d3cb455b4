//! Shell command execution
//!
//! Runs a command string through the platform shell and returns the captured
//! output. This is the only place the agent host spawns processes.

use async_trait::async_trait;
use shared::tool::ToolError;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Combined output beyond this many bytes is cut off
const MAX_OUTPUT_LEN: usize = 10_000;

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command`, returning trimmed combined stdout/stderr on exit status 0.
    async fn execute(&self, command: &str) -> Result<String, ToolError>;
}

/// Runs commands via `sh -c` (`cmd /C` on Windows)
pub struct ShellRunner {
    shell: String,
    shell_arg: String,
    timeout: Option<Duration>,
}

impl ShellRunner {
    pub fn new() -> Self {
        // Determine shell based on OS
        let (shell, shell_arg) = if cfg!(windows) {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };
        Self::with_shell(shell, shell_arg)
    }

    pub fn with_shell(shell: impl Into<String>, shell_arg: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            shell_arg: shell_arg.into(),
            timeout: None,
        }
    }

    /// Kill commands that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn execute(&self, command: &str) -> Result<String, ToolError> {
        let start = Instant::now();
        let child = Command::new(&self.shell)
            .arg(&self.shell_arg)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(command, secs = limit.as_secs(), "command timed out");
                    return Err(ToolError::TimedOut {
                        secs: limit.as_secs(),
                    });
                }
            },
            None => child.await,
        }
        .map_err(|e| ToolError::LaunchFailed(format!("{}: {}", self.shell, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut combined = stdout.trim_end().to_string();
        if !stderr.trim().is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str(stderr.trim_end());
        }
        let combined = truncate_output(combined.trim());

        tracing::debug!(
            command,
            code = ?output.status.code(),
            duration_ms = start.elapsed().as_millis() as u64,
            "command finished"
        );

        if output.status.success() {
            Ok(combined)
        } else {
            Err(ToolError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                output: combined,
            })
        }
    }
}

fn truncate_output(output: &str) -> String {
    if output.len() <= MAX_OUTPUT_LEN {
        return output.to_string();
    }
    let mut cut = MAX_OUTPUT_LEN;
    while !output.is_char_boundary(cut) {
        cut -= 1;
    }
    format!(
        "{}\n... (output truncated, {} bytes total)",
        &output[..cut],
        output.len()
    )
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_trimmed() {
        let out = ShellRunner::new().execute("echo hi").await.unwrap();
        assert_eq!(out, "hi");
    }

    #[tokio::test]
    async fn test_stdout_and_stderr_combined() {
        let out = ShellRunner::new()
            .execute("echo out; echo err 1>&2")
            .await
            .unwrap();
        assert_eq!(out, "out\nerr");
    }

    #[tokio::test]
    async fn test_empty_output() {
        let out = ShellRunner::new().execute("true").await.unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn test_non_zero_exit_keeps_output() {
        let err = ShellRunner::new()
            .execute("echo oops; exit 3")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::NonZeroExit {
                code: 3,
                output: "oops".into()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_shell_is_launch_failure() {
        let runner = ShellRunner::with_shell("/nonexistent/shell-binary", "-c");
        let err = runner.execute("echo hi").await.unwrap_err();
        assert!(matches!(err, ToolError::LaunchFailed(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let runner = ShellRunner::new().with_timeout(Some(Duration::from_millis(100)));
        let err = runner.execute("sleep 5").await.unwrap_err();
        assert!(matches!(err, ToolError::TimedOut { .. }));
    }

    #[test]
    fn test_truncate_output() {
        let long = "é".repeat(MAX_OUTPUT_LEN);
        let out = truncate_output(&long);
        assert!(out.contains("output truncated"));
        assert!(out.len() < long.len());
        assert_eq!(truncate_output("short"), "short");
    }
}
