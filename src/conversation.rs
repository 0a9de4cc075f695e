//! Append-only conversation history.
//!
//! The completion endpoint is stateless, so the full ordered history is
//! resent on every request. Turns are immutable once appended; the only
//! mutation the store exposes is appending.

use serde_json::Value;

use crate::llm::ModelReply;

/// Outcome of executing one tool call, fed back to the model.
///
/// `payload` is `{"result": <value>}` on success or `{"error": "<text>"}`
/// on failure, tagged with the originating call so the model can map each
/// result back to its request.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    pub payload: Value,
}

/// One entry in the conversation.
#[derive(Debug, Clone)]
pub enum Turn {
    /// Plain user text.
    User { text: String },
    /// A raw model reply, preserved verbatim for echo-back. Some endpoints
    /// reject a history whose assistant turns differ from what they sent.
    Model(ModelReply),
    /// One round's tool results, in request order.
    ToolResults(Vec<ToolResult>),
}

/// Ordered history for a single session.
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `user` turn. Always succeeds; empty text is forwarded as-is.
    pub fn append_user_text(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::User { text: text.into() });
    }

    /// Append the raw model reply exactly as received.
    pub fn append_model_turn(&mut self, reply: ModelReply) {
        self.turns.push(Turn::Model(reply));
    }

    /// Append one aggregate turn carrying a round's ordered tool results.
    pub fn append_tool_results(&mut self, results: Vec<ToolResult>) {
        self.turns.push(Turn::ToolResults(results));
    }

    /// The full ordered sequence, for transmission.
    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_reply(text: &str) -> ModelReply {
        ModelReply {
            content: Some(text.to_string()),
            tool_calls: None,
        }
    }

    #[test]
    fn appends_are_monotonic() {
        let mut conversation = Conversation::new();
        assert!(conversation.is_empty());

        conversation.append_user_text("hello");
        assert_eq!(conversation.len(), 1);

        conversation.append_model_turn(text_reply("hi"));
        assert_eq!(conversation.len(), 2);

        conversation.append_tool_results(vec![]);
        assert_eq!(conversation.len(), 3);
    }

    #[test]
    fn later_appends_leave_prior_turns_untouched() {
        let mut conversation = Conversation::new();
        conversation.append_user_text("first");
        conversation.append_model_turn(text_reply("second"));

        let Turn::User { text } = &conversation.snapshot()[0] else {
            panic!("first turn should be a user turn");
        };
        assert_eq!(text, "first");

        conversation.append_user_text("third");
        let Turn::User { text } = &conversation.snapshot()[0] else {
            panic!("first turn should still be a user turn");
        };
        assert_eq!(text, "first");
    }

    #[test]
    fn snapshot_is_idempotent_between_appends() {
        let mut conversation = Conversation::new();
        conversation.append_user_text("hello");
        conversation.append_tool_results(vec![ToolResult {
            call_id: "call_1".to_string(),
            name: "read_file".to_string(),
            payload: json!({"result": "ok"}),
        }]);

        let first = conversation.snapshot().len();
        let second = conversation.snapshot().len();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_user_text_is_stored_verbatim() {
        let mut conversation = Conversation::new();
        conversation.append_user_text("");
        let Turn::User { text } = &conversation.snapshot()[0] else {
            panic!("expected a user turn");
        };
        assert!(text.is_empty());
    }

    #[test]
    fn tool_results_keep_their_order() {
        let mut conversation = Conversation::new();
        let results = vec![
            ToolResult {
                call_id: "call_1".to_string(),
                name: "read_file".to_string(),
                payload: json!({"result": "a"}),
            },
            ToolResult {
                call_id: "call_2".to_string(),
                name: "grep_search".to_string(),
                payload: json!({"error": "no matches"}),
            },
        ];
        conversation.append_tool_results(results);

        let Turn::ToolResults(stored) = &conversation.snapshot()[0] else {
            panic!("expected a tool-results turn");
        };
        assert_eq!(stored[0].call_id, "call_1");
        assert_eq!(stored[1].call_id, "call_2");
    }
}
