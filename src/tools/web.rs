//! Web access tools: search, fetch, and raw HTTP requests.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; toolchat/0.1)";
const FETCH_LIMIT_CHARS: usize = 20_000;
const HTTP_LIMIT_CHARS: usize = 5_000;

fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))
}

/// Search the web via DuckDuckGo HTML (no API key needed).
pub struct WebSearch;

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Returns search results with titles and snippets. Use for finding documentation, examples, or current information."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 5)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let query = args["query"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' argument"))?;
        let num_results = args["num_results"].as_u64().unwrap_or(5) as usize;

        let url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );

        let client = http_client(15)?;
        let html = match client.get(&url).send().await {
            Ok(response) => match response.text().await {
                Ok(text) => text,
                Err(e) => return Ok(format!("Error reading search response: {}", e)),
            },
            Err(e) => return Ok(format!("Error performing web search: {}", e)),
        };

        let results = extract_ddg_results(&html, num_results);
        if results.is_empty() {
            Ok(format!("No results found for: {}", query))
        } else {
            Ok(results.join("\n\n"))
        }
    }
}

/// Extract search results from DuckDuckGo's HTML result page.
fn extract_ddg_results(html: &str, limit: usize) -> Vec<String> {
    let mut results = Vec::new();

    for chunk in html.split("class=\"result__body\"").skip(1) {
        if results.len() >= limit {
            break;
        }

        let title = field_after(chunk, "class=\"result__a\"").unwrap_or_default();
        let snippet = field_after(chunk, "class=\"result__snippet\"").unwrap_or_default();
        let url = field_after(chunk, "class=\"result__url\"")
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        if !title.is_empty() {
            results.push(format!(
                "**{}**\n{}\nURL: {}",
                html_decode(&title),
                html_decode(&snippet),
                url
            ));
        }
    }

    results
}

/// The text content of the first element following `marker`.
fn field_after(chunk: &str, marker: &str) -> Option<String> {
    chunk
        .split(marker)
        .nth(1)?
        .split('>')
        .nth(1)?
        .split('<')
        .next()
        .map(str::to_string)
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

/// Fetch content from a URL.
pub struct FetchUrl;

#[async_trait]
impl Tool for FetchUrl {
    fn name(&self) -> &str {
        "fetch_url"
    }

    fn description(&self) -> &str {
        "Fetch the content of a URL. HTML pages are reduced to readable text. Useful for reading documentation or downloading data."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to fetch"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let url = args["url"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'url' argument"))?;

        let client = http_client(30)?;
        let response = match client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return Ok(format!("Error fetching URL: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(format!("Error: HTTP {} for '{}'", status, url));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = match response.text().await {
            Ok(text) => text,
            Err(e) => return Ok(format!("Error reading response body: {}", e)),
        };

        let result = if content_type.contains("text/html") {
            extract_text_from_html(&body)
        } else {
            body
        };

        if result.len() > FETCH_LIMIT_CHARS {
            Ok(format!(
                "{}... [content truncated, showing first {} chars]",
                &result[..FETCH_LIMIT_CHARS],
                FETCH_LIMIT_CHARS
            ))
        } else {
            Ok(result)
        }
    }
}

/// Strip an HTML document down to its readable text.
fn extract_text_from_html(html: &str) -> String {
    let without_scripts = strip_element(html, "<script", "</script>");
    let without_styles = strip_element(&without_scripts, "<style", "</style>");

    let mut text = String::new();
    let mut in_tag = false;
    for c in without_styles.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    html_decode(&collapsed)
}

/// Remove every `open`..`close` element, including the tags.
fn strip_element(html: &str, open: &str, close: &str) -> String {
    let mut text = html.to_string();
    while let Some(start) = text.find(open) {
        match text[start..].find(close) {
            Some(end) => text.replace_range(start..start + end + close.len(), ""),
            None => break,
        }
    }
    text
}

/// Make a raw HTTP request.
pub struct HttpRequest;

#[async_trait]
impl Tool for HttpRequest {
    fn name(&self) -> &str {
        "http_request"
    }

    fn description(&self) -> &str {
        "Make an HTTP request with a chosen method, optional JSON headers, and an optional body. Returns the status line and response body."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Request URL"
                },
                "method": {
                    "type": "string",
                    "description": "HTTP method: GET, POST, PUT, PATCH or DELETE (default: GET)"
                },
                "headers": {
                    "type": "object",
                    "description": "Optional headers as a JSON object of string values"
                },
                "body": {
                    "type": "string",
                    "description": "Optional request body"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let url = args["url"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'url' argument"))?;
        let method = args["method"].as_str().unwrap_or("GET").to_uppercase();
        let body = args["body"].as_str().unwrap_or("");

        let client = http_client(15)?;
        let mut request = match method.as_str() {
            "GET" => client.get(url),
            "POST" => client.post(url),
            "PUT" => client.put(url),
            "PATCH" => client.patch(url),
            "DELETE" => client.delete(url),
            other => {
                return Ok(format!(
                    "Error: Unsupported method '{}'. Use GET, POST, PUT, PATCH or DELETE.",
                    other
                ))
            }
        };

        if let Some(headers) = args["headers"].as_object() {
            for (key, value) in headers {
                if let Some(value) = value.as_str() {
                    request = request.header(key, value);
                }
            }
        }
        if !body.is_empty() {
            request = request.body(body.to_string());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Ok(format!("Error making HTTP request: {}", e)),
        };

        let status = response.status();
        let mut content = match response.text().await {
            Ok(text) => text,
            Err(e) => return Ok(format!("Error reading response body: {}", e)),
        };

        if content.len() > HTTP_LIMIT_CHARS {
            let total = content.len();
            content.truncate(HTTP_LIMIT_CHARS);
            content.push_str(&format!("\n\n... (truncated, total {} chars)", total));
        }

        Ok(format!("HTTP {}\n\n{}", status.as_u16(), content))
    }
}
