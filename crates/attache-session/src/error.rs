//! Error types for attache-session

use thiserror::Error;

/// Result type alias using attache-session Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a session
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the wire layer
    #[error(transparent)]
    Wire(#[from] attache_wire::Error),

    /// Thread creation failed; the session needs a reset before sending
    #[error("thread initialization failed: {0}")]
    ThreadInit(#[source] attache_wire::Error),

    /// A send was attempted without an initialized thread
    #[error("thread not initialized")]
    ThreadUnavailable,
}
