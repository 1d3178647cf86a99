//! Conversation history for a single review request.
//!
//! The history is append-only. After an assistant turn that requests tools,
//! only tool results answering those calls may be appended, each call
//! exactly once, before the conversation is ready for the next model call.

use crate::models::{Message, Role, ToolCall};

/// Ordered message history owned by one review.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    /// Calls from the latest assistant turn that still need a result.
    pending: Vec<ToolCall>,
}

impl Conversation {
    /// Start a conversation with the system prompt and the caller's request.
    pub fn new(system_prompt: &str, request: &str) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(request)],
            pending: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when every tool call of the last assistant turn has been answered.
    pub fn is_ready_for_model(&self) -> bool {
        self.pending.is_empty()
    }

    /// Append an assistant turn verbatim and return the tool calls it requests.
    ///
    /// # Panics
    ///
    /// If tool calls from the previous assistant turn are still unanswered.
    pub fn push_assistant(&mut self, message: Message) -> Vec<ToolCall> {
        assert!(
            self.pending.is_empty(),
            "assistant turn appended with {} unanswered tool calls",
            self.pending.len()
        );
        debug_assert_eq!(message.role, Role::Assistant);

        let calls = message.requested_tool_calls().to_vec();
        self.pending = calls.clone();
        self.messages.push(message);
        calls
    }

    /// Append the result for one pending tool call.
    ///
    /// # Panics
    ///
    /// If `tool_call_id` does not name an unanswered call from the last
    /// assistant turn.
    pub fn push_tool_result(&mut self, tool_call_id: &str, content: String) {
        let Some(idx) = self.pending.iter().position(|c| c.id == tool_call_id) else {
            panic!("tool result for unknown or already answered call {tool_call_id}");
        };
        self.pending.remove(idx);
        self.messages.push(Message::tool_result(tool_call_id, content));
    }
}
