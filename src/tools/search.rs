//! Code search tools: grep/regex search over files.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;

use super::Tool;

const MAX_MATCH_LINES: usize = 100;

/// Search file contents with regex/grep.
pub struct GrepSearch;

#[async_trait]
impl Tool for GrepSearch {
    fn name(&self) -> &str {
        "grep_search"
    }

    fn description(&self) -> &str {
        "Search for a pattern in file contents using regex. Returns matching lines with file paths and line numbers. Great for finding function definitions, usages, or specific code patterns."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regex pattern to search for"
                },
                "path": {
                    "type": "string",
                    "description": "Directory to search in, relative to workspace. Defaults to workspace root."
                },
                "file_pattern": {
                    "type": "string",
                    "description": "Optional: only search files matching this glob (e.g., '*.rs', '*.py')"
                },
                "case_sensitive": {
                    "type": "boolean",
                    "description": "Whether search is case-sensitive (default: false)"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let pattern = args["pattern"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'pattern' argument"))?;
        let path = args["path"].as_str().unwrap_or(".");
        let file_pattern = args["file_pattern"].as_str();
        let case_sensitive = args["case_sensitive"].as_bool().unwrap_or(false);

        run_search(pattern, path, file_pattern, case_sensitive, workspace).await
    }
}

/// Find TODO/FIXME markers in a directory tree.
pub struct FindTodos;

#[async_trait]
impl Tool for FindTodos {
    fn name(&self) -> &str {
        "find_todos"
    }

    fn description(&self) -> &str {
        "Find TODO, FIXME, HACK, and XXX markers in source files under a directory."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to scan, relative to workspace. Defaults to workspace root."
                }
            }
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let path = args["path"].as_str().unwrap_or(".");
        run_search("TODO|FIXME|HACK|XXX", path, None, true, workspace).await
    }
}

/// Run the search through ripgrep when available, plain grep otherwise.
async fn run_search(
    pattern: &str,
    path: &str,
    file_pattern: Option<&str>,
    case_sensitive: bool,
    workspace: &Path,
) -> anyhow::Result<String> {
    let search_path = workspace.join(path);
    if !search_path.exists() {
        return Ok(format!("Error: Directory '{}' does not exist.", path));
    }

    let mut cmd = if which_exists("rg").await {
        let mut c = Command::new("rg");
        c.arg("--line-number");
        c.arg("--no-heading");
        c.arg("--color=never");

        if !case_sensitive {
            c.arg("-i");
        }
        if let Some(fp) = file_pattern {
            c.arg("-g").arg(fp);
        }

        c.arg("--").arg(pattern).arg(&search_path);
        c
    } else {
        let mut c = Command::new("grep");
        c.arg("-rnE");

        if !case_sensitive {
            c.arg("-i");
        }
        if let Some(fp) = file_pattern {
            c.arg("--include").arg(fp);
        }

        c.arg(pattern).arg(&search_path);
        c
    };

    let output = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute search: {}", e))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    // Both rg and grep exit 1 on "no matches"; anything else is a real error.
    if !output.status.success() && output.status.code() != Some(1) && !stderr.is_empty() {
        return Ok(format!("Search error: {}", stderr.trim()));
    }

    if stdout.is_empty() {
        return Ok(format!("No matches found for pattern: {}", pattern));
    }

    // Report workspace-relative paths.
    let workspace_str = workspace.to_string_lossy();
    let result: String = stdout
        .lines()
        .take(MAX_MATCH_LINES)
        .map(|line| line.replace(&*workspace_str, ".").replace("./", ""))
        .collect::<Vec<_>>()
        .join("\n");

    if result.lines().count() >= MAX_MATCH_LINES {
        Ok(format!(
            "{}\n\n... (showing first {} matches)",
            result, MAX_MATCH_LINES
        ))
    } else {
        Ok(result)
    }
}

/// Check if a command exists in PATH.
async fn which_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_matches_with_line_numbers() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("code.rs"), "fn alpha() {}\nfn beta() {}\n")
            .await
            .unwrap();

        let out = GrepSearch
            .execute(json!({"pattern": "fn beta"}), dir.path())
            .await
            .unwrap();
        assert!(out.contains("code.rs"));
        assert!(out.contains("2"));
    }

    #[tokio::test]
    async fn no_matches_is_reported_as_text() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("code.rs"), "fn alpha() {}\n")
            .await
            .unwrap();

        let out = GrepSearch
            .execute(json!({"pattern": "zeta_never_appears"}), dir.path())
            .await
            .unwrap();
        assert_eq!(out, "No matches found for pattern: zeta_never_appears");
    }

    #[tokio::test]
    async fn todo_scan_spots_markers() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("main.rs"),
            "// TODO: wire up retries\nfn main() {}\n",
        )
        .await
        .unwrap();

        let out = FindTodos.execute(json!({}), dir.path()).await.unwrap();
        assert!(out.contains("TODO: wire up retries"));
    }

    #[tokio::test]
    async fn missing_directory_is_error_text() {
        let dir = tempfile::tempdir().unwrap();
        let out = GrepSearch
            .execute(json!({"pattern": "x", "path": "no_such_dir"}), dir.path())
            .await
            .unwrap();
        assert_eq!(out, "Error: Directory 'no_such_dir' does not exist.");
    }
}
