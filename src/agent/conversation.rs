//! Conversation state - the ordered message log carried across agent runs.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::Result;

use super::message::{Message, Role, ToolCallRequest};

/// Ordered, append-only log of messages.
///
/// Appending a tool result is checked against the most recent assistant
/// message: the result must answer one of its calls that has no result yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation from a single user message.
    pub fn from_user(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(content)],
        }
    }

    /// Append a message, enforcing the tool-result pairing rule.
    pub fn push(&mut self, message: Message) -> Result<()> {
        if message.role == Role::Tool {
            let call_id = message
                .tool_call_id
                .as_deref()
                .ok_or_else(|| Error::Conversation("tool result without a call id".to_string()))?;

            if !self.pending_calls().iter().any(|c| c.id == call_id) {
                return Err(Error::Conversation(format!(
                    "tool result for '{call_id}' does not answer a pending call"
                )));
            }
        }

        self.messages.push(message);
        Ok(())
    }

    /// Append a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Calls of the latest assistant message that have no result yet.
    ///
    /// Only tool results may sit between that assistant message and the end
    /// of the log; anything else means nothing is pending.
    pub fn pending_calls(&self) -> Vec<&ToolCallRequest> {
        let mut answered = Vec::new();

        for message in self.messages.iter().rev() {
            match message.role {
                Role::Tool => answered.extend(message.tool_call_id.as_deref()),
                Role::Assistant => {
                    return message
                        .tool_calls
                        .iter()
                        .filter(|c| !answered.contains(&c.id.as_str()))
                        .collect();
                }
                Role::User => break,
            }
        }

        Vec::new()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Content of the final message, i.e. the user-facing answer after a run.
    pub fn final_answer(&self) -> Option<&str> {
        self.last()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::ToolCallResult;
    use serde_json::json;

    fn assistant_with(calls: &[&ToolCallRequest]) -> Message {
        Message::assistant_with_tools("", calls.iter().map(|c| (*c).clone()).collect())
    }

    #[test]
    fn test_tool_result_must_answer_pending_call() {
        let call = ToolCallRequest::new("get_lounge", json!({}));
        let mut conv = Conversation::from_user("hi");
        conv.push(assistant_with(&[&call])).unwrap();

        assert_eq!(conv.pending_calls().len(), 1);
        conv.push(Message::tool_result(&call, ToolCallResult::ok(&call.id, "ok")))
            .unwrap();
        assert!(conv.pending_calls().is_empty());

        // Answering the same call twice is rejected
        let err = conv
            .push(Message::tool_result(&call, ToolCallResult::ok(&call.id, "again")))
            .unwrap_err();
        assert!(matches!(err, Error::Conversation(_)));
    }

    #[test]
    fn test_tool_result_without_assistant_is_rejected() {
        let call = ToolCallRequest::new("get_lounge", json!({}));
        let mut conv = Conversation::from_user("hi");
        assert!(conv
            .push(Message::tool_result(&call, ToolCallResult::ok(&call.id, "x")))
            .is_err());
    }

    #[test]
    fn test_pending_calls_tracks_partial_batch() {
        let a = ToolCallRequest::new("get_lounge", json!({}));
        let b = ToolCallRequest::new("get_flight_data", json!({}));
        let mut conv = Conversation::from_user("hi");
        conv.push(assistant_with(&[&a, &b])).unwrap();
        conv.push(Message::tool_result(&b, ToolCallResult::ok(&b.id, "ok")))
            .unwrap();

        let pending = conv.pending_calls();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, a.id);
    }

    #[test]
    fn test_final_answer() {
        let mut conv = Conversation::from_user("hi");
        assert_eq!(conv.final_answer(), None);
        conv.push(Message::assistant("hello")).unwrap();
        assert_eq!(conv.final_answer(), Some("hello"));
    }
}
