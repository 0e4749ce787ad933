//! attache-session: streaming session engine for the Attaché assistant
//!
//! This crate turns the agent service's framed events into consistent,
//! replayable conversation state: an ordered message list patched in place
//! while a response streams in, a thread lifecycle that survives resets,
//! and a send controller enforcing single-flight turns.

pub mod conversation;
pub mod error;
pub mod events;
pub mod session;
pub mod thread;
pub mod transport;

pub use conversation::{ChatMessage, ConversationState, FunctionCallRecord, Role};
pub use error::{Error, Result};
pub use events::SessionEvent;
pub use session::{DEFAULT_FILE_PROMPT, Session, SessionConfig};
pub use thread::{ThreadLifecycle, ThreadState};
pub use transport::{AgentTransport, HttpTransport};
