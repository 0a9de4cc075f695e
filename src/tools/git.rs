//! Git operation tools.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;

use super::Tool;

const MAX_DIFF_CHARS: usize = 10_000;

/// Get git status.
pub struct GitStatus;

#[async_trait]
impl Tool for GitStatus {
    fn name(&self) -> &str {
        "git_status"
    }

    fn description(&self) -> &str {
        "Get the current git status, showing modified, staged, and untracked files."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _args: Value, workspace: &Path) -> anyhow::Result<String> {
        let output = run_git(&["status", "--porcelain=v2", "--branch"], workspace).await?;
        if output.lines().all(|l| l.starts_with('#')) {
            Ok("No changes (working tree clean)".to_string())
        } else {
            Ok(output)
        }
    }
}

/// Get git diff.
pub struct GitDiff;

#[async_trait]
impl Tool for GitDiff {
    fn name(&self) -> &str {
        "git_diff"
    }

    fn description(&self) -> &str {
        "Show git diff of changes. Can diff staged changes or a specific file."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "staged": {
                    "type": "boolean",
                    "description": "Show staged changes instead of unstaged (default: false)"
                },
                "file": {
                    "type": "string",
                    "description": "Optional: show diff for specific file only"
                }
            }
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let staged = args["staged"].as_bool().unwrap_or(false);
        let file = args["file"].as_str();

        let mut git_args = vec!["diff"];
        if staged {
            git_args.push("--staged");
        }
        if let Some(f) = file {
            git_args.push("--");
            git_args.push(f);
        }

        let result = run_git(&git_args, workspace).await?;

        if result.is_empty() {
            Ok("No changes".to_string())
        } else if result.len() > MAX_DIFF_CHARS {
            Ok(format!(
                "{}... [diff truncated, showing first {} chars]",
                &result[..MAX_DIFF_CHARS],
                MAX_DIFF_CHARS
            ))
        } else {
            Ok(result)
        }
    }
}

/// Create a git commit.
pub struct GitCommit;

#[async_trait]
impl Tool for GitCommit {
    fn name(&self) -> &str {
        "git_commit"
    }

    fn description(&self) -> &str {
        "Stage changes and create a git commit with the given message."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The commit message"
                },
                "files": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional: specific files to stage. If not provided, stages all changes."
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let message = args["message"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'message' argument"))?;

        let files: Vec<&str> = args["files"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        let staged = if files.is_empty() {
            run_git(&["add", "-A"], workspace).await?
        } else {
            let mut git_args = vec!["add", "--"];
            git_args.extend(files);
            run_git(&git_args, workspace).await?
        };
        if staged.starts_with("Git error:") {
            return Ok(staged);
        }

        run_git(&["commit", "-m", message], workspace).await
    }
}

/// Get git log.
pub struct GitLog;

#[async_trait]
impl Tool for GitLog {
    fn name(&self) -> &str {
        "git_log"
    }

    fn description(&self) -> &str {
        "Show recent git commits."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "num_commits": {
                    "type": "integer",
                    "description": "Number of commits to show (default: 10)"
                },
                "oneline": {
                    "type": "boolean",
                    "description": "Show condensed one-line format (default: true)"
                }
            }
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let num_commits = args["num_commits"].as_u64().unwrap_or(10);
        let oneline = args["oneline"].as_bool().unwrap_or(true);

        let num_str = num_commits.to_string();
        let mut git_args = vec!["log", "-n", num_str.as_str()];
        if oneline {
            git_args.push("--oneline");
        }

        run_git(&git_args, workspace).await
    }
}

/// Manage git branches.
pub struct GitBranch;

#[async_trait]
impl Tool for GitBranch {
    fn name(&self) -> &str {
        "git_branch"
    }

    fn description(&self) -> &str {
        "List, create, switch to, or delete git branches."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "description": "One of: list, create, switch, delete (default: list)"
                },
                "branch_name": {
                    "type": "string",
                    "description": "Branch name, required for create/switch/delete"
                }
            }
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let operation = args["operation"].as_str().unwrap_or("list");
        let branch_name = args["branch_name"].as_str().unwrap_or("");

        if operation != "list" && branch_name.is_empty() {
            return Ok(format!(
                "Error: 'branch_name' is required for operation '{}'.",
                operation
            ));
        }

        match operation {
            "list" => run_git(&["branch", "-a"], workspace).await,
            "create" => run_git(&["checkout", "-b", branch_name], workspace).await,
            "switch" => run_git(&["checkout", branch_name], workspace).await,
            "delete" => run_git(&["branch", "-d", branch_name], workspace).await,
            other => Ok(format!(
                "Error: Unknown operation '{}'. Use: list, create, switch, delete",
                other
            )),
        }
    }
}

/// Run a git command in the workspace.
///
/// A non-zero exit comes back as `Git error: ...` text in the normal
/// channel so the model can read it; `Err` is reserved for a git binary
/// that cannot be spawned at all.
async fn run_git(args: &[&str], workspace: &Path) -> anyhow::Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(workspace)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run git: {}", e))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        let detail = if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        };
        return Ok(format!("Git error: {}", detail));
    }

    Ok(stdout.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn status_outside_a_repository_is_error_text() {
        let dir = tempfile::tempdir().unwrap();
        let out = GitStatus.execute(json!({}), dir.path()).await.unwrap();
        assert!(out.starts_with("Git error:"), "got: {}", out);
    }

    #[tokio::test]
    async fn branch_requires_a_name_for_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let out = GitBranch
            .execute(json!({"operation": "create"}), dir.path())
            .await
            .unwrap();
        assert_eq!(
            out,
            "Error: 'branch_name' is required for operation 'create'."
        );
    }

    #[tokio::test]
    async fn branch_rejects_unknown_operations() {
        let dir = tempfile::tempdir().unwrap();
        let out = GitBranch
            .execute(
                json!({"operation": "rebase", "branch_name": "main"}),
                dir.path(),
            )
            .await
            .unwrap();
        assert!(out.starts_with("Error: Unknown operation 'rebase'"));
    }
}
