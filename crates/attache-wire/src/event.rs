//! Stream event types for an in-flight assistant turn

use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Events emitted while a turn's response streams in.
///
/// Within one turn, every `Text`/`FunctionCall` event precedes the terminal
/// `Done`/`Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Partial assistant text, positional: appended in arrival order
    Text { content: String },
    /// An action the agent invoked, reported with its already-executed result
    FunctionCall {
        name: String,
        #[serde(default)]
        args: serde_json::Value,
        result: FunctionCallResult,
    },
    /// Turn completed successfully
    Done,
    /// Turn failed; carries the service's description
    Error { error: String },
}

impl StreamEvent {
    /// Create a text delta event
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Check if this is a terminal event (Done or Error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error { .. })
    }
}

/// Outcome of an executed function call.
///
/// Services attach action-specific fields beyond `success` and `created`;
/// those are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A stream of parsed events
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;
