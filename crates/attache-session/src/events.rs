//! Session event types

use serde::{Deserialize, Serialize};

/// Events broadcast while a session processes turns.
///
/// `MessageUpdated` is the re-render signal: it fires for every append and
/// every patch applied to the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A turn started; the user message and response slot exist
    TurnStart,

    /// The message at `index` was appended or patched
    MessageUpdated { index: usize },

    /// The agent invoked an action during the current turn
    FunctionCallRecorded { name: String },

    /// The turn finished, successfully or not
    TurnEnd,

    /// The remote thread is ready for sends
    ThreadReady { thread_id: String },

    /// The conversation was cleared and the thread is being recreated
    ThreadReset,

    /// A failure was recorded into the conversation
    Error { message: String },
}

impl SessionEvent {
    /// Check if this event ends a turn
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::TurnEnd | SessionEvent::Error { .. })
    }
}
