//! Transport abstraction over the agent service

use async_trait::async_trait;
use attache_wire::{AgentClient, EventStream, SendRequest};

/// Boundary into the agent runtime.
///
/// The production implementation is [`HttpTransport`]; tests substitute
/// mocks that script the event stream.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Create a thread for `session_id`, returning its id.
    async fn create_thread(&self, session_id: &str) -> attache_wire::Result<String>;

    /// Delete a thread. Idempotent from the caller's perspective.
    async fn delete_thread(&self, thread_id: &str) -> attache_wire::Result<()>;

    /// Send one turn and open its event stream.
    async fn send_message(&self, request: SendRequest) -> attache_wire::Result<EventStream>;
}

/// Transport backed by the HTTP client.
pub struct HttpTransport {
    client: AgentClient,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: AgentClient::new(base_url),
        }
    }
}

#[async_trait]
impl AgentTransport for HttpTransport {
    async fn create_thread(&self, session_id: &str) -> attache_wire::Result<String> {
        self.client.create_thread(session_id).await
    }

    async fn delete_thread(&self, thread_id: &str) -> attache_wire::Result<()> {
        self.client.delete_thread(thread_id).await
    }

    async fn send_message(&self, request: SendRequest) -> attache_wire::Result<EventStream> {
        self.client.send_message(request).await
    }
}
