//! Session Management
//!
//! A session is one exchange with the model: it is created for a single
//! question, accumulates the model and tool turns needed to answer it, and is
//! dropped afterwards. Nothing is shared or persisted across sessions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::{Conversation, Message};
use crate::tool::ToolCall;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single-question agent session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Conversation history
    pub conversation: Conversation,

    /// Tool calls executed so far, in order
    pub tool_calls: Vec<ToolCall>,

    /// Model completions requested so far
    pub round_trips: usize,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            conversation: Conversation::new(),
            tool_calls: Vec::new(),
            round_trips: 0,
        }
    }

    /// Start a session for one question, with an optional system instruction
    pub fn start(system_prompt: Option<&str>, query: impl Into<String>) -> Self {
        let mut session = Self::new();
        if let Some(prompt) = system_prompt {
            session.conversation = Conversation::with_system_prompt(prompt);
        }
        session.conversation.push(Message::user(query));
        session
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        self.conversation.push(message);
    }

    /// Record an executed tool call
    pub fn record_tool_call(&mut self, call: ToolCall) {
        self.tool_calls.push(call);
    }

    /// Message count
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn test_session_creation() {
        let session = Session::new();
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.round_trips, 0);
        assert!(session.tool_calls.is_empty());
    }

    #[test]
    fn test_start_with_prompt() {
        let session = Session::start(Some("Be brief."), "What is the capital of France?");
        let messages = session.conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "What is the capital of France?");

        let bare = Session::start(None, "hi");
        assert_eq!(bare.message_count(), 1);
    }

    #[test]
    fn test_sessions_are_distinct() {
        let a = Session::start(None, "same question");
        let b = Session::start(None, "same question");
        assert_ne!(a.id, b.id);
    }
}
