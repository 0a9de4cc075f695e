//! Shell command execution tool.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;

use super::Tool;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MAX_OUTPUT_CHARS: usize = 10_000;

/// Run a shell command.
pub struct RunCommand;

#[async_trait]
impl Tool for RunCommand {
    fn name(&self) -> &str {
        "run_command"
    }

    fn description(&self) -> &str {
        "Execute a shell command in the workspace directory. Returns exit code, stdout and stderr. Use for running tests, installing dependencies, compiling code, etc."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                },
                "timeout_secs": {
                    "type": "integer",
                    "description": "Timeout in seconds (default: 60)"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let command = args["command"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'command' argument"))?;
        let timeout_secs = args["timeout_secs"].as_u64().unwrap_or(DEFAULT_TIMEOUT_SECS);

        tracing::info!("Executing command: {}", command);

        let (shell, shell_arg) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let output = tokio::time::timeout(
            std::time::Duration::from_secs(timeout_secs),
            Command::new(shell)
                .arg(shell_arg)
                .arg(command)
                .current_dir(workspace)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output(),
        )
        .await;

        let output = match output {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Ok(format!("Error: Failed to execute command: {}", e)),
            Err(_) => {
                return Ok(format!(
                    "Error: Command timed out after {} seconds.",
                    timeout_secs
                ))
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);

        let mut result = format!("Exit code: {}\n", exit_code);

        if !stdout.is_empty() {
            result.push_str("\n--- stdout ---\n");
            result.push_str(&stdout);
        }
        if !stderr.is_empty() {
            result.push_str("\n--- stderr ---\n");
            result.push_str(&stderr);
        }

        if result.len() > MAX_OUTPUT_CHARS {
            result.truncate(MAX_OUTPUT_CHARS);
            result.push_str("\n... [output truncated]");
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_exit_code_and_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let out = RunCommand
            .execute(json!({"command": "echo tool output"}), dir.path())
            .await
            .unwrap();
        assert!(out.starts_with("Exit code: 0"));
        assert!(out.contains("tool output"));
    }

    #[tokio::test]
    async fn nonzero_exit_is_data_not_failure() {
        let dir = tempfile::tempdir().unwrap();
        let out = RunCommand
            .execute(json!({"command": "exit 3"}), dir.path())
            .await
            .unwrap();
        assert!(out.starts_with("Exit code: 3"));
    }

    #[tokio::test]
    async fn timeout_is_reported_as_error_text() {
        let dir = tempfile::tempdir().unwrap();
        let out = RunCommand
            .execute(
                json!({"command": "sleep 5", "timeout_secs": 1}),
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(out, "Error: Command timed out after 1 seconds.");
    }
}
