//! Core dispatch loop implementation.

use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;

use crate::config::Config;
use crate::conversation::{Conversation, ToolResult, Turn};
use crate::llm::{ChatMessage, LlmClient, ModelReply, Role, ToolCall};
use crate::tools::ToolRegistry;

use super::prompt::build_system_prompt;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The model kept requesting tools for the whole round budget.
    #[error("Model requested tools for {rounds} consecutive rounds without finishing")]
    MaxRoundsExceeded { rounds: usize },

    /// The completion endpoint failed; the exchange cannot continue.
    #[error(transparent)]
    Llm(#[from] anyhow::Error),
}

/// One interactive session: owns its conversation, shares the client and
/// the registry.
pub struct Session {
    config: Config,
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    conversation: Conversation,
    system_prompt: String,
}

impl Session {
    /// Create a session over the given client and registry.
    pub fn new(config: Config, llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>) -> Self {
        let system_prompt = config.system_prompt.clone().unwrap_or_else(|| {
            build_system_prompt(&config.workspace_path.to_string_lossy(), &tools)
        });

        Self {
            config,
            llm,
            tools,
            conversation: Conversation::new(),
            system_prompt,
        }
    }

    /// The session's history so far.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Run one user message through to a terminal reply.
    ///
    /// Loops through tool rounds until the model replies with no tool
    /// calls, then returns that reply. A reply carrying no text is still a
    /// valid outcome; callers decide how to display it.
    pub async fn run(&mut self, user_input: &str) -> Result<ModelReply, SessionError> {
        self.conversation.append_user_text(user_input);
        let schemas = self.tools.schemas();

        for round in 0..self.config.max_rounds {
            tracing::debug!(round, "requesting completion");

            let messages = self.wire_messages();
            let reply = self
                .llm
                .chat_completion(&self.config.default_model, &messages, Some(&schemas))
                .await?;
            self.conversation.append_model_turn(reply.clone());

            let calls = reply.requested_calls().to_vec();
            if calls.is_empty() {
                return Ok(reply);
            }

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                results.push(self.dispatch(call).await);
            }
            self.conversation.append_tool_results(results);
        }

        Err(SessionError::MaxRoundsExceeded {
            rounds: self.config.max_rounds,
        })
    }

    /// Resolve a single tool call.
    ///
    /// Never fails: unknown names and tool faults both come back as
    /// error-shaped payloads the model can read and correct.
    async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let name = call.function.name.as_str();

        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(tool = name, "model requested unknown tool");
            return ToolResult {
                call_id: call.id.clone(),
                name: name.to_string(),
                payload: json!({ "error": format!("Tool '{}' not found.", name) }),
            };
        };

        // Malformed argument JSON degrades to null; the tool reports the
        // missing fields itself.
        let args: Value = serde_json::from_str(&call.function.arguments).unwrap_or(Value::Null);

        tracing::info!(tool = name, "executing tool");
        let payload = match tool.execute(args, &self.config.workspace_path).await {
            Ok(output) => json!({ "result": output }),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool execution failed");
                json!({ "error": format!("{:#}", e) })
            }
        };

        ToolResult {
            call_id: call.id.clone(),
            name: name.to_string(),
            payload,
        }
    }

    /// Lower the history into wire messages, system instruction first.
    ///
    /// The aggregate tool-results turn expands into one `tool` message per
    /// result, keeping request order, because the wire protocol maps
    /// results back to calls through `tool_call_id`.
    fn wire_messages(&self) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage {
            role: Role::System,
            content: Some(self.system_prompt.clone()),
            tool_calls: None,
            tool_call_id: None,
        }];

        for turn in self.conversation.snapshot() {
            match turn {
                Turn::User { text } => messages.push(ChatMessage {
                    role: Role::User,
                    content: Some(text.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                }),
                Turn::Model(reply) => messages.push(ChatMessage {
                    role: Role::Assistant,
                    content: reply.content.clone(),
                    tool_calls: reply.tool_calls.clone(),
                    tool_call_id: None,
                }),
                Turn::ToolResults(results) => {
                    for result in results {
                        messages.push(ChatMessage {
                            role: Role::Tool,
                            content: Some(result.payload.to_string()),
                            tool_calls: None,
                            tool_call_id: Some(result.call_id.clone()),
                        });
                    }
                }
            }
        }

        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FunctionCall;
    use crate::tools::Tool;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// LlmClient fake that pops scripted replies and records every request.
    struct ScriptedClient {
        replies: Mutex<VecDeque<ModelReply>>,
        calls: AtomicUsize,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<ModelReply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn chat_completion(
            &self,
            _model: &str,
            messages: &[ChatMessage],
            _tools: Option<&[Value]>,
        ) -> anyhow::Result<ModelReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("script exhausted"))
        }
    }

    struct Shout;

    #[async_trait]
    impl Tool for Shout {
        fn name(&self) -> &str {
            "shout"
        }

        fn description(&self) -> &str {
            "Uppercase the given text."
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            })
        }

        async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
            Ok(args["text"].as_str().unwrap_or_default().to_uppercase())
        }
    }

    struct Broken;

    #[async_trait]
    impl Tool for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always fails."
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: Value, _workspace: &Path) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("disk on fire"))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Shout)).unwrap();
        registry.register(Arc::new(Broken)).unwrap();
        Arc::new(registry)
    }

    fn config() -> Config {
        let mut config = Config::new(
            "test-key".to_string(),
            "test/model".to_string(),
            PathBuf::from("/tmp"),
        );
        config.max_rounds = 5;
        config
    }

    fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    fn text_reply(text: &str) -> ModelReply {
        ModelReply {
            content: Some(text.to_string()),
            tool_calls: None,
        }
    }

    fn tool_reply(calls: Vec<ToolCall>) -> ModelReply {
        ModelReply {
            content: None,
            tool_calls: Some(calls),
        }
    }

    fn last_results(session: &Session) -> &[ToolResult] {
        session
            .conversation()
            .snapshot()
            .iter()
            .rev()
            .find_map(|turn| match turn {
                Turn::ToolResults(results) => Some(results.as_slice()),
                _ => None,
            })
            .expect("no tool-results turn in conversation")
    }

    #[tokio::test]
    async fn terminal_reply_takes_one_model_call() {
        let client = Arc::new(ScriptedClient::new(vec![text_reply("hello there")]));
        let mut session = Session::new(config(), client.clone(), registry());

        let reply = session.run("hi").await.unwrap();
        assert_eq!(reply.content.as_deref(), Some("hello there"));
        assert_eq!(client.call_count(), 1);
        // user turn + model turn
        assert_eq!(session.conversation().len(), 2);
    }

    #[tokio::test]
    async fn one_tool_round_takes_two_model_calls() {
        let client = Arc::new(ScriptedClient::new(vec![
            tool_reply(vec![call("call_1", "shout", r#"{"text": "files in /tmp"}"#)]),
            text_reply("Here are the files: FILES IN /TMP"),
        ]));
        let mut session = Session::new(config(), client.clone(), registry());

        let reply = session.run("list files in /tmp").await.unwrap();
        assert_eq!(
            reply.content.as_deref(),
            Some("Here are the files: FILES IN /TMP")
        );
        assert_eq!(client.call_count(), 2);

        let results = last_results(&session);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].payload["result"], "FILES IN /TMP");
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_result_and_loop_continues() {
        let client = Arc::new(ScriptedClient::new(vec![
            tool_reply(vec![call("call_1", "nonexistent_tool", "{}")]),
            text_reply("that tool does not exist"),
        ]));
        let mut session = Session::new(config(), client.clone(), registry());

        let reply = session.run("please use the magic tool").await.unwrap();
        assert_eq!(reply.content.as_deref(), Some("that tool does not exist"));
        assert_eq!(client.call_count(), 2);

        let results = last_results(&session);
        assert_eq!(
            results[0].payload,
            json!({ "error": "Tool 'nonexistent_tool' not found." })
        );
    }

    #[tokio::test]
    async fn sibling_calls_resolve_in_request_order_within_one_turn() {
        let client = Arc::new(ScriptedClient::new(vec![
            tool_reply(vec![
                call("call_a", "shout", r#"{"text": "first"}"#),
                call("call_b", "nonexistent_tool", "{}"),
                call("call_c", "shout", r#"{"text": "third"}"#),
            ]),
            text_reply("done"),
        ]));
        let mut session = Session::new(config(), client.clone(), registry());

        session.run("do three things").await.unwrap();

        let results = last_results(&session);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].call_id, "call_a");
        assert_eq!(results[0].payload["result"], "FIRST");
        assert_eq!(results[1].call_id, "call_b");
        assert!(results[1].payload["error"]
            .as_str()
            .unwrap()
            .contains("nonexistent_tool"));
        assert_eq!(results[2].call_id, "call_c");
        assert_eq!(results[2].payload["result"], "THIRD");
    }

    #[tokio::test]
    async fn tool_fault_degrades_to_error_payload() {
        let client = Arc::new(ScriptedClient::new(vec![
            tool_reply(vec![call("call_1", "broken", "{}")]),
            text_reply("the tool failed"),
        ]));
        let mut session = Session::new(config(), client.clone(), registry());

        let reply = session.run("break something").await.unwrap();
        assert_eq!(reply.content.as_deref(), Some("the tool failed"));

        let results = last_results(&session);
        assert!(results[0].payload["error"]
            .as_str()
            .unwrap()
            .contains("disk on fire"));
    }

    #[tokio::test]
    async fn round_cap_is_a_distinct_outcome() {
        let endless: Vec<ModelReply> = (0..10)
            .map(|i| tool_reply(vec![call(&format!("call_{i}"), "shout", r#"{"text": "x"}"#)]))
            .collect();
        let client = Arc::new(ScriptedClient::new(endless));
        let mut session = Session::new(config(), client.clone(), registry());

        let err = session.run("loop forever").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::MaxRoundsExceeded { rounds: 5 }
        ));
        assert_eq!(client.call_count(), 5);
    }

    #[tokio::test]
    async fn textless_terminal_reply_is_valid() {
        let client = Arc::new(ScriptedClient::new(vec![ModelReply {
            content: None,
            tool_calls: None,
        }]));
        let mut session = Session::new(config(), client, registry());

        let reply = session.run("say nothing").await.unwrap();
        assert!(reply.content.is_none());
    }

    #[tokio::test]
    async fn history_is_echoed_back_verbatim_on_the_next_request() {
        let client = Arc::new(ScriptedClient::new(vec![
            tool_reply(vec![call("call_1", "shout", r#"{"text": "hi"}"#)]),
            text_reply("HI"),
        ]));
        let mut session = Session::new(config(), client.clone(), registry());
        session.run("shout hi").await.unwrap();

        let requests = client.requests.lock().unwrap();
        let second = &requests[1];

        // system, user, assistant w/ tool calls, tool result
        assert_eq!(second.len(), 4);
        assert_eq!(second[0].role, Role::System);
        assert_eq!(second[1].role, Role::User);
        assert_eq!(second[2].role, Role::Assistant);
        assert!(second[2].tool_calls.as_ref().unwrap().len() == 1);
        assert_eq!(second[3].role, Role::Tool);
        assert_eq!(second[3].tool_call_id.as_deref(), Some("call_1"));
        let payload: Value =
            serde_json::from_str(second[3].content.as_deref().unwrap()).unwrap();
        assert_eq!(payload["result"], "HI");
    }

    #[tokio::test]
    async fn llm_failure_propagates_to_the_caller() {
        // Empty script: the first completion call fails.
        let client = Arc::new(ScriptedClient::new(vec![]));
        let mut session = Session::new(config(), client, registry());

        let err = session.run("hello").await.unwrap_err();
        assert!(matches!(err, SessionError::Llm(_)));
    }

    #[tokio::test]
    async fn malformed_arguments_still_reach_the_tool() {
        let client = Arc::new(ScriptedClient::new(vec![
            tool_reply(vec![call("call_1", "shout", "not json")]),
            text_reply("ok"),
        ]));
        let mut session = Session::new(config(), client, registry());

        session.run("garbage args").await.unwrap();

        // Arguments degraded to null; the tool ran and returned its default.
        let results = last_results(&session);
        assert_eq!(results[0].payload["result"], "");
    }
}
