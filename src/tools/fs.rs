//! File operation tools.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;

use super::Tool;

/// Files larger than this are refused by `read_file`.
const MAX_READ_BYTES: u64 = 10 * 1024 * 1024;

/// Resolve a tool-supplied path against the workspace directory.
pub(crate) fn resolve(workspace: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

/// Read a text file.
pub struct ReadFile;

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a text file. Paths are relative to the workspace directory."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to read"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let file_path = args["file_path"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'file_path' argument"))?;
        let path = resolve(workspace, file_path);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(_) => return Ok(format!("Error: File '{}' does not exist.", file_path)),
        };
        if !metadata.is_file() {
            return Ok(format!("Error: '{}' is not a file.", file_path));
        }
        if metadata.len() > MAX_READ_BYTES {
            return Ok(format!(
                "Error: File too large ({:.2}MB). Maximum size is 10MB.",
                metadata.len() as f64 / 1024.0 / 1024.0
            ));
        }

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(contents),
            Err(e) => Ok(format!("Error reading file: {}", e)),
        }
    }
}

/// Write (overwrite) a text file.
pub struct WriteFile;

#[async_trait]
impl Tool for WriteFile {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write text to a file, creating it (and any parent directories) if needed and replacing existing contents."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to write"
                },
                "contents": {
                    "type": "string",
                    "description": "Full contents to write"
                }
            },
            "required": ["file_path", "contents"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let file_path = args["file_path"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'file_path' argument"))?;
        let contents = args["contents"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'contents' argument"))?;
        let path = resolve(workspace, file_path);

        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return Ok(format!("Error creating parent directories: {}", e));
            }
        }

        match tokio::fs::write(&path, contents).await {
            Ok(()) => Ok(format!(
                "Successfully wrote {} bytes to '{}'.",
                contents.len(),
                file_path
            )),
            Err(e) => Ok(format!("Error writing file: {}", e)),
        }
    }
}

/// Append to a text file.
pub struct AppendFile;

#[async_trait]
impl Tool for AppendFile {
    fn name(&self) -> &str {
        "append_file"
    }

    fn description(&self) -> &str {
        "Append text to the end of a file without overwriting it. Creates the file if it does not exist."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to append to"
                },
                "contents": {
                    "type": "string",
                    "description": "Text to append"
                }
            },
            "required": ["file_path", "contents"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let file_path = args["file_path"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'file_path' argument"))?;
        let contents = args["contents"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'contents' argument"))?;
        let path = resolve(workspace, file_path);

        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return Ok(format!("Error creating parent directories: {}", e));
            }
        }

        let file = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .await;

        match file {
            Ok(mut file) => match file.write_all(contents.as_bytes()).await {
                Ok(()) => Ok(format!(
                    "Successfully appended {} bytes to '{}'.",
                    contents.len(),
                    file_path
                )),
                Err(e) => Ok(format!("Error appending to file: {}", e)),
            },
            Err(e) => Ok(format!("Error opening file: {}", e)),
        }
    }
}

/// Delete a file.
pub struct DeleteFile;

#[async_trait]
impl Tool for DeleteFile {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn description(&self) -> &str {
        "Delete a single file. Refuses directories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to delete"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let file_path = args["file_path"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'file_path' argument"))?;
        let path = resolve(workspace, file_path);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(_) => return Ok(format!("Error: File '{}' does not exist.", file_path)),
        };
        if !metadata.is_file() {
            return Ok(format!("Error: '{}' is not a file.", file_path));
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(format!("Successfully deleted '{}'.", file_path)),
            Err(e) => Ok(format!("Error deleting file: {}", e)),
        }
    }
}

/// Literal find/replace within one file.
pub struct FindReplace;

#[async_trait]
impl Tool for FindReplace {
    fn name(&self) -> &str {
        "find_replace"
    }

    fn description(&self) -> &str {
        "Replace every occurrence of a literal string in a file and report how many replacements were made."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to edit"
                },
                "find": {
                    "type": "string",
                    "description": "Literal text to find"
                },
                "replace": {
                    "type": "string",
                    "description": "Replacement text"
                }
            },
            "required": ["file_path", "find", "replace"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let file_path = args["file_path"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'file_path' argument"))?;
        let find = args["find"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'find' argument"))?;
        let replace = args["replace"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'replace' argument"))?;
        let path = resolve(workspace, file_path);

        if find.is_empty() {
            return Ok("Error: 'find' must not be empty.".to_string());
        }

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(_) => return Ok(format!("Error: File '{}' does not exist.", file_path)),
        };

        let count = contents.matches(find).count();
        if count == 0 {
            return Ok(format!("No occurrences of '{}' found in '{}'.", find, file_path));
        }

        let updated = contents.replace(find, replace);
        match tokio::fs::write(&path, updated).await {
            Ok(()) => Ok(format!(
                "Replaced {} occurrence(s) in '{}'.",
                count, file_path
            )),
            Err(e) => Ok(format!("Error writing file: {}", e)),
        }
    }
}

/// List a directory.
pub struct ListDirectory;

#[async_trait]
impl Tool for ListDirectory {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List the entries of a directory. Directories are suffixed with '/', files show their size in bytes."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to list, relative to the workspace. Defaults to the workspace root."
                }
            }
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let raw = args["path"].as_str().unwrap_or(".");
        let path = resolve(workspace, raw);

        let mut entries = match tokio::fs::read_dir(&path).await {
            Ok(rd) => rd,
            Err(_) => return Ok(format!("Error: Directory '{}' does not exist.", raw)),
        };

        let mut lines = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            match entry.metadata().await {
                Ok(metadata) if metadata.is_dir() => lines.push(format!("{}/", name)),
                Ok(metadata) => lines.push(format!("{}  ({} bytes)", name, metadata.len())),
                Err(_) => lines.push(name),
            }
        }
        lines.sort();

        if lines.is_empty() {
            Ok(format!("Directory '{}' is empty.", raw))
        } else {
            Ok(lines.join("\n"))
        }
    }
}

/// Metadata for one path.
pub struct FileInfo;

#[async_trait]
impl Tool for FileInfo {
    fn name(&self) -> &str {
        "file_info"
    }

    fn description(&self) -> &str {
        "Show metadata for a path: kind, size in bytes, and last-modified time as a unix timestamp."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to inspect"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let raw = args["path"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'path' argument"))?;
        let path = resolve(workspace, raw);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(_) => return Ok(format!("Error: Path '{}' does not exist.", raw)),
        };

        let kind = if metadata.is_dir() { "directory" } else { "file" };
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_secs().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(format!(
            "Path: {}\nKind: {}\nSize: {} bytes\nModified (unix): {}",
            raw,
            kind,
            metadata.len(),
            modified
        ))
    }
}
