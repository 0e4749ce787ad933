//! The streaming send controller: one `Session` per conversation

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use attache_wire::{Attachment, SendRequest, StreamEvent};

use crate::{
    conversation::{ChatMessage, ConversationState},
    error::Result,
    events::SessionEvent,
    thread::{ThreadLifecycle, ThreadState},
    transport::AgentTransport,
};

/// Prompt sent in place of blank text when a file is attached.
pub const DEFAULT_FILE_PROMPT: &str =
    "Analyze the attached file and summarize what it contains.";

const THREAD_INIT_NOTICE: &str =
    "the assistant session could not be started. Reset the conversation to try again";
const REQUEST_FAILED_NOTICE: &str = "the request could not be completed. Please try again";

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Stable id grouping this session's threads on the agent service
    pub session_id: String,
    /// Overrides [`DEFAULT_FILE_PROMPT`] for file-only sends
    pub file_prompt: Option<String>,
}

impl SessionConfig {
    /// Config with a freshly generated session id
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            file_prompt: None,
        }
    }

    pub fn with_session_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            file_prompt: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One assistant conversation: owns the message list and the remote thread,
/// and runs one streamed turn at a time.
///
/// Sessions are independent values; two open tabs are two `Session`s. All
/// methods take `&self`, so a session is shared by `Arc` between the UI and
/// background tasks.
pub struct Session {
    config: SessionConfig,
    transport: Arc<dyn AgentTransport>,
    thread: ThreadLifecycle,
    conversation: Mutex<ConversationState>,
    in_flight: AtomicBool,
    /// Bumped by reset; events from older turns are discarded.
    generation: AtomicU64,
    cancel: Mutex<CancellationToken>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(config: SessionConfig, transport: Arc<dyn AgentTransport>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let thread = ThreadLifecycle::new(Arc::clone(&transport), config.session_id.clone());
        Self {
            config,
            transport,
            thread,
            conversation: Mutex::new(ConversationState::new()),
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            cancel: Mutex::new(CancellationToken::new()),
            event_tx,
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Lock the conversation for reading
    pub fn conversation(&self) -> parking_lot::MutexGuard<'_, ConversationState> {
        self.conversation.lock()
    }

    /// Snapshot of the conversation for rendering
    pub fn snapshot(&self) -> ConversationState {
        self.conversation.lock().clone()
    }

    /// Whether a turn is currently in flight
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn thread_state(&self) -> ThreadState {
        self.thread.state().await
    }

    /// Create the remote thread ahead of the first send.
    pub async fn start(&self) -> Result<()> {
        let thread_id = self.thread.ensure().await?;
        let _ = self.event_tx.send(SessionEvent::ThreadReady { thread_id });
        Ok(())
    }

    /// Run one turn to completion or failure.
    ///
    /// At most one turn is in flight at a time: a send while one is running
    /// is a no-op, as is a send with no text and no file. A rejected
    /// attachment short-circuits before any network I/O. Every turn-local
    /// failure lands as a single readable replacement message in the
    /// conversation; the typed error is also returned for callers that care.
    pub async fn send(&self, text: &str, attachment: Option<Attachment>) -> Result<()> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!("send ignored: a turn is already in flight");
            return Ok(());
        }
        let _flight = FlightGuard {
            in_flight: &self.in_flight,
        };

        let text = text.trim();
        if text.is_empty() && attachment.is_none() {
            tracing::debug!("send ignored: nothing to send");
            return Ok(());
        }

        let generation = self.generation.load(Ordering::Acquire);
        let cancel = {
            let fresh = CancellationToken::new();
            *self.cancel.lock() = fresh.clone();
            fresh
        };

        // The response slot must exist before any byte arrives.
        let display_text = if text.is_empty() {
            let filename = attachment
                .as_ref()
                .map(|file| file.filename.as_str())
                .unwrap_or_default();
            format!("uploaded: {filename}")
        } else {
            text.to_string()
        };
        let _ = self.event_tx.send(SessionEvent::TurnStart);
        self.append_turn_messages(display_text);

        // A rejected file never reaches the network.
        if let Some(file) = &attachment {
            if let Err(rejection) = file.validate() {
                tracing::warn!(media_type = %file.media_type, "attachment rejected");
                self.fail_turn(generation, rejection.to_string());
                return Err(rejection.into());
            }
        }

        let thread_id = match self.thread.ensure().await {
            Ok(id) => id,
            Err(e) => {
                self.fail_turn(generation, THREAD_INIT_NOTICE.to_string());
                return Err(e);
            }
        };

        let message = if text.is_empty() {
            self.config
                .file_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_FILE_PROMPT.to_string())
        } else {
            text.to_string()
        };
        let request = SendRequest {
            thread_id,
            message,
            attachment,
        };

        let mut events = match self.transport.send_message(request).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, "send request failed");
                self.fail_turn(generation, REQUEST_FAILED_NOTICE.to_string());
                return Err(e.into());
            }
        };

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("turn cancelled by reset");
                    break;
                }
                next = events.next() => match next {
                    Some(event) => event,
                    // Connection close is the fallback terminator.
                    None => break,
                },
            };

            if let StreamEvent::Error { error } = &event {
                // Application-level signal, distinct from a transport failure.
                tracing::warn!(%error, "server signaled an error");
            }
            let terminal = event.is_terminal();
            self.apply_if_current(generation, &event);
            if terminal {
                break;
            }
        }

        let _ = self.event_tx.send(SessionEvent::TurnEnd);
        Ok(())
    }

    /// Clear the conversation and recreate the remote thread.
    ///
    /// The generation bump makes any still-running turn stale before the
    /// first await; the cancellation unblocks its read loop.
    pub async fn reset(&self) -> Result<()> {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cancel.lock().cancel();
        self.conversation.lock().clear();
        let _ = self.event_tx.send(SessionEvent::ThreadReset);

        let thread_id = self.thread.reset().await?;
        let _ = self.event_tx.send(SessionEvent::ThreadReady { thread_id });
        Ok(())
    }

    /// Dispose of the remote thread at session end.
    pub async fn close(&self) {
        self.cancel.lock().cancel();
        self.thread.dispose().await;
    }

    fn append_turn_messages(&self, user_text: String) {
        let index = {
            let mut conversation = self.conversation.lock();
            conversation.append(ChatMessage::user(user_text));
            conversation.append(ChatMessage::assistant_placeholder());
            conversation.len() - 1
        };
        let _ = self.event_tx.send(SessionEvent::MessageUpdated { index });
    }

    /// Apply an event unless the turn that produced it was reset away.
    fn apply_if_current(&self, generation: u64, event: &StreamEvent) {
        if self.generation.load(Ordering::Acquire) != generation {
            tracing::debug!("discarding event from a stale turn");
            return;
        }
        let index = {
            let mut conversation = self.conversation.lock();
            conversation.apply_event(event);
            conversation.len().saturating_sub(1)
        };
        match event {
            StreamEvent::FunctionCall { name, .. } => {
                let _ = self.event_tx.send(SessionEvent::FunctionCallRecorded {
                    name: name.clone(),
                });
                let _ = self.event_tx.send(SessionEvent::MessageUpdated { index });
            }
            StreamEvent::Error { error } => {
                let _ = self.event_tx.send(SessionEvent::MessageUpdated { index });
                let _ = self.event_tx.send(SessionEvent::Error {
                    message: error.clone(),
                });
            }
            StreamEvent::Done => {}
            StreamEvent::Text { .. } => {
                let _ = self.event_tx.send(SessionEvent::MessageUpdated { index });
            }
        }
    }

    /// Replace the pending assistant slot with a failure notice and end the
    /// turn.
    fn fail_turn(&self, generation: u64, notice: String) {
        self.apply_if_current(generation, &StreamEvent::Error { error: notice });
        let _ = self.event_tx.send(SessionEvent::TurnEnd);
    }
}

/// Releases the single-flight flag on every exit path.
struct FlightGuard<'a> {
    in_flight: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}
