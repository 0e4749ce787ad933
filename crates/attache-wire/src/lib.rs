//! attache-wire: wire protocol for the Attaché assistant service
//!
//! This crate provides the framed stream event types, the incremental frame
//! parser, attachment handling, and the HTTP client for the agent service.

pub mod attachment;
pub mod client;
pub mod error;
pub mod event;
pub mod parser;

pub use attachment::{ALLOWED_MEDIA_TYPES, Attachment};
pub use client::{AgentClient, SendRequest};
pub use error::{Error, Result};
pub use event::{EventStream, FunctionCallResult, StreamEvent};
pub use parser::EventFrameParser;
