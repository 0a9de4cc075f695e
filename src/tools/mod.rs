//! Tool trait and registry.
//!
//! Each tool is a stateless boundary function with a declared JSON schema.
//! By convention tools report expected failures (missing file, bad pattern,
//! non-zero exit) as descriptive text in their normal return channel and
//! reserve `Err` for faults they cannot describe; the dispatch loop
//! degrades those into error-shaped results as well.

mod archive;
mod fs;
mod git;
mod search;
mod terminal;
mod text;
mod web;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

/// A callable tool the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name, as advertised to the model.
    fn name(&self) -> &str;

    /// Human-readable description, shown in the tool schema and the
    /// system prompt.
    fn description(&self) -> &str;

    /// JSON Schema for the argument object.
    fn parameters_schema(&self) -> Value;

    /// Invoke the tool with the decoded argument object.
    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String>;
}

/// Name and description pair used to render the system prompt.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate tool name: {0}")]
    DuplicateName(String),
}

/// Read-only catalog of tools, safely shared across sessions.
///
/// Names are globally unique; registration fails loudly at construction,
/// not at dispatch time.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// An empty registry. Mostly useful in tests.
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// The full built-in tool set.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        // Files
        registry.register(Arc::new(fs::ReadFile))?;
        registry.register(Arc::new(fs::WriteFile))?;
        registry.register(Arc::new(fs::AppendFile))?;
        registry.register(Arc::new(fs::DeleteFile))?;
        registry.register(Arc::new(fs::FindReplace))?;
        registry.register(Arc::new(fs::ListDirectory))?;
        registry.register(Arc::new(fs::FileInfo))?;

        // Git
        registry.register(Arc::new(git::GitStatus))?;
        registry.register(Arc::new(git::GitDiff))?;
        registry.register(Arc::new(git::GitCommit))?;
        registry.register(Arc::new(git::GitLog))?;
        registry.register(Arc::new(git::GitBranch))?;

        // Search
        registry.register(Arc::new(search::GrepSearch))?;
        registry.register(Arc::new(search::FindTodos))?;

        // Shell
        registry.register(Arc::new(terminal::RunCommand))?;

        // Web
        registry.register(Arc::new(web::WebSearch))?;
        registry.register(Arc::new(web::FetchUrl))?;
        registry.register(Arc::new(web::HttpRequest))?;

        // Text
        registry.register(Arc::new(text::RegexSearch))?;
        registry.register(Arc::new(text::RegexReplace))?;
        registry.register(Arc::new(text::FormatText))?;
        registry.register(Arc::new(text::EncodeBase64))?;
        registry.register(Arc::new(text::DecodeBase64))?;

        // Archives
        registry.register(Arc::new(archive::CreateZip))?;
        registry.register(Arc::new(archive::ExtractZip))?;
        registry.register(Arc::new(archive::ListArchive))?;

        Ok(registry)
    }

    /// Add a tool, rejecting duplicate names.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Every tool's schema in the function-calling wire format, advertised
    /// on every model call.
    pub fn schemas(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name(),
                        "description": tool.description(),
                        "parameters": tool.parameters_schema(),
                    }
                })
            })
            .collect()
    }

    /// Name/description listing for the system prompt.
    pub fn list(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
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

    struct Dummy(&'static str);

    #[async_trait]
    impl Tool for Dummy {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "dummy tool"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: Value, _workspace: &Path) -> anyhow::Result<String> {
            Ok("ok".to_string())
        }
    }

    #[test]
    fn duplicate_names_are_rejected_at_registration() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Dummy("echo"))).unwrap();

        let err = registry.register(Arc::new(Dummy("echo"))).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(name) if name == "echo"));
    }

    #[test]
    fn lookup_misses_return_none() {
        let registry = ToolRegistry::new();
        assert!(registry.get("nonexistent_tool").is_none());
    }

    #[test]
    fn builtin_registry_has_unique_wire_schemas() {
        let registry = ToolRegistry::builtin().unwrap();
        assert!(!registry.is_empty());

        let schemas = registry.schemas();
        assert_eq!(schemas.len(), registry.len());
        for schema in &schemas {
            assert_eq!(schema["type"], "function");
            let name = schema["function"]["name"].as_str().unwrap();
            assert!(registry.get(name).is_some());
        }
    }

    #[test]
    fn listing_matches_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Dummy("first"))).unwrap();
        registry.register(Arc::new(Dummy("second"))).unwrap();

        let names: Vec<_> = registry.list().into_iter().map(|spec| spec.name).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
