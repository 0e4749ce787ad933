//! Conversation state: the ordered message list and last-message patching

use attache_wire::{FunctionCallResult, StreamEvent};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Message roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A function the agent invoked during a turn, kept as an auditable log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallRecord {
    pub name: String,
    pub args: serde_json::Value,
    pub result: FunctionCallResult,
}

/// One entry in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub function_calls: Vec<FunctionCallRecord>,
    #[serde(default)]
    pub timestamp: i64,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
            function_calls: vec![],
            timestamp: now_ms(),
        }
    }

    /// Empty assistant slot appended at turn start, so the UI has a response
    /// slot before any byte arrives.
    pub fn assistant_placeholder() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            function_calls: vec![],
            timestamp: now_ms(),
        }
    }

    /// Content for rendering.
    ///
    /// While stored content is still empty but function calls have landed,
    /// a transient label names them. The label is presentation only; it is
    /// never written into `content`.
    pub fn display_content(&self) -> Cow<'_, str> {
        if self.content.is_empty() && !self.function_calls.is_empty() {
            let names: Vec<&str> = self
                .function_calls
                .iter()
                .map(|call| call.name.as_str())
                .collect();
            Cow::Owned(format!("Completed: {}", names.join(", ")))
        } else {
            Cow::Borrowed(&self.content)
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Ordered message list supporting append and patch-last-message.
///
/// The sequence is append-only except for the last message while its turn
/// is in flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message to the end of the sequence.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Empty the list (reset).
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Apply a stream event to the last message.
    ///
    /// Application depends only on the event and the current state, so
    /// replaying an identical ordered event list against an equal seed
    /// state produces an equal final state.
    pub fn apply_event(&mut self, event: &StreamEvent) {
        let Some(last) = self.messages.last_mut() else {
            tracing::warn!("stream event arrived with no message slot, dropping");
            return;
        };
        match event {
            StreamEvent::Text { content } => last.content.push_str(content),
            StreamEvent::FunctionCall { name, args, result } => {
                last.function_calls.push(FunctionCallRecord {
                    name: name.clone(),
                    args: args.clone(),
                    result: result.clone(),
                });
            }
            StreamEvent::Done => {}
            StreamEvent::Error { error } => {
                last.content = format!("Something went wrong: {error}");
            }
        }
    }
}
