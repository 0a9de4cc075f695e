//! Zip archive tools.
//!
//! Archive I/O is synchronous, so each tool runs its work on the blocking
//! pool.

use std::fs::File;
use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Value};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::fs::resolve;
use super::Tool;

fn zip_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Create a zip archive from a file or directory.
pub struct CreateZip;

#[async_trait]
impl Tool for CreateZip {
    fn name(&self) -> &str {
        "create_zip"
    }

    fn description(&self) -> &str {
        "Create a zip archive from a file or a directory tree."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source_path": {
                    "type": "string",
                    "description": "File or directory to archive"
                },
                "zip_path": {
                    "type": "string",
                    "description": "Path of the zip file to create"
                }
            },
            "required": ["source_path", "zip_path"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let source_raw = args["source_path"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'source_path' argument"))?
            .to_string();
        let zip_raw = args["zip_path"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'zip_path' argument"))?
            .to_string();

        let source = resolve(workspace, &source_raw);
        let zip_path = resolve(workspace, &zip_raw);

        tokio::task::spawn_blocking(move || create_zip(&source, &source_raw, &zip_path, &zip_raw))
            .await
            .map_err(|e| anyhow::anyhow!("Archive task failed: {}", e))?
    }
}

fn create_zip(
    source: &Path,
    source_raw: &str,
    zip_path: &Path,
    zip_raw: &str,
) -> anyhow::Result<String> {
    if !source.exists() {
        return Ok(format!("Error: Path '{}' does not exist.", source_raw));
    }

    let file = match File::create(zip_path) {
        Ok(file) => file,
        Err(e) => return Ok(format!("Error creating archive: {}", e)),
    };
    let mut writer = ZipWriter::new(file);
    let mut count = 0usize;

    if source.is_file() {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());
        if let Err(e) = add_file(&mut writer, source, &name) {
            return Ok(format!("Error adding '{}' to archive: {}", source_raw, e));
        }
        count += 1;
    } else {
        for entry in WalkDir::new(source).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            // Never zip the archive into itself.
            if entry.path() == zip_path {
                continue;
            }
            let name = entry
                .path()
                .strip_prefix(source)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .to_string();
            if let Err(e) = add_file(&mut writer, entry.path(), &name) {
                return Ok(format!("Error adding '{}' to archive: {}", name, e));
            }
            count += 1;
        }
    }

    if let Err(e) = writer.finish() {
        return Ok(format!("Error finalizing archive: {}", e));
    }

    Ok(format!("Created '{}' with {} file(s).", zip_raw, count))
}

fn add_file(writer: &mut ZipWriter<File>, path: &Path, name: &str) -> anyhow::Result<()> {
    writer.start_file(name, zip_options())?;
    let mut reader = File::open(path)?;
    std::io::copy(&mut reader, writer)?;
    Ok(())
}

/// Extract a zip archive.
pub struct ExtractZip;

#[async_trait]
impl Tool for ExtractZip {
    fn name(&self) -> &str {
        "extract_zip"
    }

    fn description(&self) -> &str {
        "Extract a zip archive into a destination directory."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "zip_path": {
                    "type": "string",
                    "description": "Path of the zip file to extract"
                },
                "dest_path": {
                    "type": "string",
                    "description": "Destination directory (default: workspace root)"
                }
            },
            "required": ["zip_path"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let zip_raw = args["zip_path"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'zip_path' argument"))?
            .to_string();
        let dest_raw = args["dest_path"].as_str().unwrap_or(".").to_string();

        let zip_path = resolve(workspace, &zip_raw);
        let dest = resolve(workspace, &dest_raw);

        tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
            let file = match File::open(&zip_path) {
                Ok(file) => file,
                Err(_) => return Ok(format!("Error: Archive '{}' does not exist.", zip_raw)),
            };
            let mut archive = match ZipArchive::new(file) {
                Ok(archive) => archive,
                Err(e) => return Ok(format!("Error reading archive: {}", e)),
            };

            let count = archive.len();
            match archive.extract(&dest) {
                Ok(()) => Ok(format!(
                    "Extracted {} entr{} from '{}' into '{}'.",
                    count,
                    if count == 1 { "y" } else { "ies" },
                    zip_raw,
                    dest_raw
                )),
                Err(e) => Ok(format!("Error extracting archive: {}", e)),
            }
        })
        .await
        .map_err(|e| anyhow::anyhow!("Archive task failed: {}", e))?
    }
}

/// List the contents of a zip archive.
pub struct ListArchive;

#[async_trait]
impl Tool for ListArchive {
    fn name(&self) -> &str {
        "list_archive"
    }

    fn description(&self) -> &str {
        "List the entries of a zip archive with their sizes."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "archive_path": {
                    "type": "string",
                    "description": "Path of the zip file to inspect"
                }
            },
            "required": ["archive_path"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let archive_raw = args["archive_path"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'archive_path' argument"))?
            .to_string();
        let archive_path = resolve(workspace, &archive_raw);

        tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
            let file = match File::open(&archive_path) {
                Ok(file) => file,
                Err(_) => return Ok(format!("Error: Archive '{}' does not exist.", archive_raw)),
            };
            let mut archive = match ZipArchive::new(file) {
                Ok(archive) => archive,
                Err(e) => return Ok(format!("Error reading archive: {}", e)),
            };

            let mut lines = vec![format!("'{}' ({} entries):", archive_raw, archive.len())];
            for i in 0..archive.len() {
                let entry = archive.by_index(i)?;
                lines.push(format!(
                    "{}  {} bytes ({} compressed)",
                    entry.name(),
                    entry.size(),
                    entry.compressed_size()
                ));
            }
            Ok(lines.join("\n"))
        })
        .await
        .map_err(|e| anyhow::anyhow!("Archive task failed: {}", e))?
    }
}
