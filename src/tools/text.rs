//! Text utility tools: regex, case formatting, base64.

use std::path::Path;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use regex::Regex;
use serde_json::{json, Value};

use super::Tool;

const MAX_SHOWN_MATCHES: usize = 50;

/// Search for a regex pattern in text.
pub struct RegexSearch;

#[async_trait]
impl Tool for RegexSearch {
    fn name(&self) -> &str {
        "regex_search"
    }

    fn description(&self) -> &str {
        "Search for a regex pattern in the given text and return all matches."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Text to search in"
                },
                "pattern": {
                    "type": "string",
                    "description": "Regex pattern to search for"
                }
            },
            "required": ["text", "pattern"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let text = args["text"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'text' argument"))?;
        let pattern = args["pattern"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'pattern' argument"))?;

        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(e) => return Ok(format!("Error: Invalid regex pattern - {}", e)),
        };

        let matches: Vec<&str> = regex.find_iter(text).map(|m| m.as_str()).collect();
        if matches.is_empty() {
            return Ok(format!("No matches found for pattern: {}", pattern));
        }

        let mut lines = vec![format!("Found {} match(es):\n", matches.len())];
        for (i, m) in matches.iter().take(MAX_SHOWN_MATCHES).enumerate() {
            lines.push(format!("{}. {}", i + 1, m));
        }
        if matches.len() > MAX_SHOWN_MATCHES {
            lines.push(format!(
                "\n... and {} more matches",
                matches.len() - MAX_SHOWN_MATCHES
            ));
        }

        Ok(lines.join("\n"))
    }
}

/// Replace all occurrences of a regex pattern in text.
pub struct RegexReplace;

#[async_trait]
impl Tool for RegexReplace {
    fn name(&self) -> &str {
        "regex_replace"
    }

    fn description(&self) -> &str {
        "Replace all occurrences of a regex pattern in the given text."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Text to perform replacement on"
                },
                "pattern": {
                    "type": "string",
                    "description": "Regex pattern to find"
                },
                "replacement": {
                    "type": "string",
                    "description": "Replacement string"
                }
            },
            "required": ["text", "pattern", "replacement"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let text = args["text"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'text' argument"))?;
        let pattern = args["pattern"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'pattern' argument"))?;
        let replacement = args["replacement"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'replacement' argument"))?;

        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(e) => return Ok(format!("Error: Invalid regex pattern - {}", e)),
        };

        let count = regex.find_iter(text).count();
        let result = regex.replace_all(text, replacement);

        Ok(format!("Replaced {} occurrence(s). Result:\n\n{}", count, result))
    }
}

/// Case/style conversions.
pub struct FormatText;

#[async_trait]
impl Tool for FormatText {
    fn name(&self) -> &str {
        "format_text"
    }

    fn description(&self) -> &str {
        "Format text with case/style operations: upper, lower, title, capitalize, snake_case, camelCase, PascalCase, kebab-case."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Text to format"
                },
                "operation": {
                    "type": "string",
                    "description": "Formatting operation to apply"
                }
            },
            "required": ["text", "operation"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let text = args["text"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'text' argument"))?;
        let operation = args["operation"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'operation' argument"))?;

        let result = match operation {
            "upper" => text.to_uppercase(),
            "lower" => text.to_lowercase(),
            "title" => text
                .split_whitespace()
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
            "capitalize" => capitalize(&text.to_lowercase()),
            "snake_case" => delimited_case(text, '_'),
            "kebab-case" => delimited_case(text, '-'),
            "camelCase" => {
                let words = split_words(text);
                let mut out = String::new();
                for (i, word) in words.iter().enumerate() {
                    if i == 0 {
                        out.push_str(&word.to_lowercase());
                    } else {
                        out.push_str(&capitalize(&word.to_lowercase()));
                    }
                }
                out
            }
            "PascalCase" => split_words(text)
                .iter()
                .map(|word| capitalize(&word.to_lowercase()))
                .collect(),
            other => {
                return Ok(format!(
                    "Error: Unknown operation '{}'. Use: upper, lower, title, capitalize, snake_case, camelCase, PascalCase, kebab-case",
                    other
                ))
            }
        };

        Ok(result)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn split_words(text: &str) -> Vec<String> {
    text.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lowercase with `sep` inserted at word and camel-hump boundaries.
fn delimited_case(text: &str, sep: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_was_sep = true;
    for c in text.chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            if !prev_was_sep {
                out.push(sep);
                prev_was_sep = true;
            }
            continue;
        }
        if c.is_uppercase() && !prev_was_sep {
            out.push(sep);
        }
        out.extend(c.to_lowercase());
        prev_was_sep = false;
    }
    while out.ends_with(sep) {
        out.pop();
    }
    out
}

/// Encode text to base64.
pub struct EncodeBase64;

#[async_trait]
impl Tool for EncodeBase64 {
    fn name(&self) -> &str {
        "encode_base64"
    }

    fn description(&self) -> &str {
        "Encode text to base64."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Text to encode"
                }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let text = args["text"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'text' argument"))?;
        Ok(format!("Base64 encoded:\n{}", BASE64.encode(text)))
    }
}

/// Decode base64 text.
pub struct DecodeBase64;

#[async_trait]
impl Tool for DecodeBase64 {
    fn name(&self) -> &str {
        "decode_base64"
    }

    fn description(&self) -> &str {
        "Decode base64 encoded text."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "encoded": {
                    "type": "string",
                    "description": "Base64 encoded string"
                }
            },
            "required": ["encoded"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let encoded = args["encoded"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'encoded' argument"))?;

        let bytes = match BASE64.decode(encoded.trim()) {
            Ok(bytes) => bytes,
            Err(e) => return Ok(format!("Error decoding base64: {}", e)),
        };

        match String::from_utf8(bytes) {
            Ok(decoded) => Ok(format!("Decoded:\n{}", decoded)),
            Err(e) => Ok(format!("Error decoding base64: not valid UTF-8 ({})", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn regex_search_lists_matches() {
        let out = RegexSearch
            .execute(
                json!({"text": "cat bat rat", "pattern": "[cb]at"}),
                Path::new("/tmp"),
            )
            .await
            .unwrap();
        assert!(out.starts_with("Found 2 match(es):"));
        assert!(out.contains("1. cat"));
        assert!(out.contains("2. bat"));
    }

    #[tokio::test]
    async fn invalid_pattern_is_error_text() {
        let out = RegexSearch
            .execute(json!({"text": "abc", "pattern": "("}), Path::new("/tmp"))
            .await
            .unwrap();
        assert!(out.starts_with("Error: Invalid regex pattern"));
    }

    #[tokio::test]
    async fn regex_replace_counts_occurrences() {
        let out = RegexReplace
            .execute(
                json!({"text": "a1b2c3", "pattern": "[0-9]", "replacement": "#"}),
                Path::new("/tmp"),
            )
            .await
            .unwrap();
        assert!(out.starts_with("Replaced 3 occurrence(s)."));
        assert!(out.ends_with("a#b#c#"));
    }

    #[tokio::test]
    async fn format_text_cases() {
        let cases = [
            ("upper", "hello world", "HELLO WORLD"),
            ("title", "hello world", "Hello World"),
            ("snake_case", "Hello WorldWide", "hello_world_wide"),
            ("kebab-case", "Hello World", "hello-world"),
            ("camelCase", "hello_world_wide", "helloWorldWide"),
            ("PascalCase", "hello-world", "HelloWorld"),
        ];
        for (operation, input, expected) in cases {
            let out = FormatText
                .execute(
                    json!({"text": input, "operation": operation}),
                    Path::new("/tmp"),
                )
                .await
                .unwrap();
            assert_eq!(out, expected, "operation {}", operation);
        }
    }

    #[tokio::test]
    async fn unknown_format_operation_is_error_text() {
        let out = FormatText
            .execute(
                json!({"text": "x", "operation": "shuffle"}),
                Path::new("/tmp"),
            )
            .await
            .unwrap();
        assert!(out.starts_with("Error: Unknown operation 'shuffle'"));
    }

    #[tokio::test]
    async fn base64_encode_then_decode() {
        let encoded = EncodeBase64
            .execute(json!({"text": "tool results"}), Path::new("/tmp"))
            .await
            .unwrap();
        let payload = encoded.strip_prefix("Base64 encoded:\n").unwrap();

        let decoded = DecodeBase64
            .execute(json!({"encoded": payload}), Path::new("/tmp"))
            .await
            .unwrap();
        assert_eq!(decoded, "Decoded:\ntool results");
    }

    #[tokio::test]
    async fn invalid_base64_is_error_text() {
        let out = DecodeBase64
            .execute(json!({"encoded": "!!!"}), Path::new("/tmp"))
            .await
            .unwrap();
        assert!(out.starts_with("Error decoding base64:"));
    }
}
