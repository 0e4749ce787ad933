//! Thread lifecycle: owns the remote conversation handle

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    error::{Error, Result},
    transport::AgentTransport,
};

/// Lifecycle states for the remote thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadState {
    Uninitialized,
    Creating,
    Ready(String),
    /// Terminal until an explicit reset re-enters `Creating`.
    Failed,
}

/// Owns the remote thread handle: creates it on first use, recreates it on
/// reset, disposes it at session end.
///
/// The state lock is held across the create call, so concurrent callers
/// serialize instead of racing two creations.
pub struct ThreadLifecycle {
    transport: Arc<dyn AgentTransport>,
    session_id: String,
    state: Mutex<ThreadState>,
}

impl ThreadLifecycle {
    pub fn new(transport: Arc<dyn AgentTransport>, session_id: impl Into<String>) -> Self {
        Self {
            transport,
            session_id: session_id.into(),
            state: Mutex::new(ThreadState::Uninitialized),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn state(&self) -> ThreadState {
        self.state.lock().await.clone()
    }

    /// Current thread id, if the thread is ready.
    pub async fn thread_id(&self) -> Option<String> {
        match &*self.state.lock().await {
            ThreadState::Ready(id) => Some(id.clone()),
            _ => None,
        }
    }

    /// Resolve to a ready thread, creating it on first use.
    ///
    /// A `Failed` lifecycle stays failed: sends must not silently retry
    /// creation. Only `reset` re-enters `Creating`.
    pub async fn ensure(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        match &*state {
            ThreadState::Ready(id) => return Ok(id.clone()),
            ThreadState::Failed => return Err(Error::ThreadUnavailable),
            ThreadState::Uninitialized | ThreadState::Creating => {}
        }
        self.create(&mut state).await
    }

    /// Best-effort delete of the current thread, then re-create bound to the
    /// same session id.
    pub async fn reset(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        self.delete_current(&state).await;
        self.create(&mut state).await
    }

    /// Session end: best-effort delete, back to `Uninitialized`.
    pub async fn dispose(&self) {
        let mut state = self.state.lock().await;
        self.delete_current(&state).await;
        *state = ThreadState::Uninitialized;
    }

    async fn delete_current(&self, state: &ThreadState) {
        if let ThreadState::Ready(id) = state {
            if let Err(e) = self.transport.delete_thread(id).await {
                tracing::warn!(error = %e, thread_id = %id, "thread delete failed, continuing");
            }
        }
    }

    async fn create(&self, state: &mut ThreadState) -> Result<String> {
        *state = ThreadState::Creating;
        match self.transport.create_thread(&self.session_id).await {
            Ok(id) => {
                tracing::info!(thread_id = %id, "thread ready");
                *state = ThreadState::Ready(id.clone());
                Ok(id)
            }
            Err(e) => {
                tracing::error!(error = %e, "thread creation failed");
                *state = ThreadState::Failed;
                Err(Error::ThreadInit(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use attache_wire::{EventStream, SendRequest};
    use parking_lot::Mutex as SyncMutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Transport that counts calls and fails on command.
    #[derive(Default)]
    struct CountingTransport {
        create_calls: AtomicU32,
        delete_calls: AtomicU32,
        /// Number of leading create calls that fail.
        fail_creates: u32,
        fail_delete: bool,
        seen_session_ids: SyncMutex<Vec<String>>,
    }

    #[async_trait]
    impl AgentTransport for CountingTransport {
        async fn create_thread(&self, session_id: &str) -> attache_wire::Result<String> {
            let call = self.create_calls.fetch_add(1, Ordering::Relaxed);
            self.seen_session_ids.lock().push(session_id.to_string());
            if call < self.fail_creates {
                return Err(attache_wire::Error::Status { status: 500 });
            }
            Ok(format!("thread-{call}"))
        }

        async fn delete_thread(&self, _thread_id: &str) -> attache_wire::Result<()> {
            self.delete_calls.fetch_add(1, Ordering::Relaxed);
            if self.fail_delete {
                return Err(attache_wire::Error::Status { status: 500 });
            }
            Ok(())
        }

        async fn send_message(&self, _request: SendRequest) -> attache_wire::Result<EventStream> {
            unreachable!("lifecycle tests never send")
        }
    }

    #[tokio::test]
    async fn test_ensure_creates_once() {
        let transport = Arc::new(CountingTransport::default());
        let lifecycle = ThreadLifecycle::new(transport.clone(), "s1");

        let first = lifecycle.ensure().await.unwrap();
        let second = lifecycle.ensure().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.create_calls.load(Ordering::Relaxed), 1);
        assert_eq!(lifecycle.state().await, ThreadState::Ready(first));
    }

    #[tokio::test]
    async fn test_failed_is_terminal_until_reset() {
        let transport = Arc::new(CountingTransport {
            fail_creates: 1,
            ..Default::default()
        });
        let lifecycle = ThreadLifecycle::new(transport.clone(), "s1");

        assert!(matches!(
            lifecycle.ensure().await,
            Err(Error::ThreadInit(_))
        ));
        assert_eq!(lifecycle.state().await, ThreadState::Failed);

        // No silent retry: the second ensure fails without another create.
        assert!(matches!(
            lifecycle.ensure().await,
            Err(Error::ThreadUnavailable)
        ));
        assert_eq!(transport.create_calls.load(Ordering::Relaxed), 1);

        // Reset re-enters Creating and recovers.
        let id = lifecycle.reset().await.unwrap();
        assert_eq!(lifecycle.state().await, ThreadState::Ready(id));
    }

    #[tokio::test]
    async fn test_reset_deletes_and_recreates_with_same_session() {
        let transport = Arc::new(CountingTransport::default());
        let lifecycle = ThreadLifecycle::new(transport.clone(), "session-9");

        let first = lifecycle.ensure().await.unwrap();
        let second = lifecycle.reset().await.unwrap();
        assert_ne!(first, second);
        assert_eq!(transport.delete_calls.load(Ordering::Relaxed), 1);
        assert_eq!(
            *transport.seen_session_ids.lock(),
            vec!["session-9".to_string(), "session-9".to_string()]
        );
    }

    #[tokio::test]
    async fn test_reset_swallows_delete_failure() {
        let transport = Arc::new(CountingTransport {
            fail_delete: true,
            ..Default::default()
        });
        let lifecycle = ThreadLifecycle::new(transport.clone(), "s1");

        lifecycle.ensure().await.unwrap();
        let id = lifecycle.reset().await.unwrap();
        assert_eq!(lifecycle.state().await, ThreadState::Ready(id));
    }

    #[tokio::test]
    async fn test_dispose_returns_to_uninitialized() {
        let transport = Arc::new(CountingTransport::default());
        let lifecycle = ThreadLifecycle::new(transport.clone(), "s1");

        lifecycle.ensure().await.unwrap();
        lifecycle.dispose().await;
        assert_eq!(lifecycle.state().await, ThreadState::Uninitialized);
        assert_eq!(transport.delete_calls.load(Ordering::Relaxed), 1);
        assert_eq!(lifecycle.thread_id().await, None);
    }
}
