//! HTTP client for the agent service boundary

use crate::{
    attachment::Attachment,
    error::{Error, Result},
    event::{EventStream, StreamEvent},
    parser::EventFrameParser,
};
use async_stream::stream;
use futures::StreamExt;
use serde::Deserialize;

/// One outbound turn request.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub thread_id: String,
    pub message: String,
    pub attachment: Option<Attachment>,
}

/// Client for the assistant agent service.
///
/// Threads group turns for the service's own context management; messages
/// answer with a streamed body of line-delimited event frames.
pub struct AgentClient {
    client: reqwest::Client,
    base_url: String,
}

impl AgentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Create a thread bound to `session_id`.
    pub async fn create_thread(&self, session_id: &str) -> Result<String> {
        let url = format!("{}/threads", self.base_url);
        tracing::debug!(%url, %session_id, "creating thread");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "sessionId": session_id }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
            });
        }

        let body: CreateThreadResponse = response.json().await?;
        body.thread_id
            .filter(|id| !id.is_empty())
            .ok_or(Error::MissingThreadId)
    }

    /// Delete a thread. 404 counts as success: the thread is gone either way.
    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let url = format!("{}/threads/{}", self.base_url, thread_id);
        tracing::debug!(%url, "deleting thread");

        let response = self.client.delete(&url).send().await?;
        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(Error::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    /// Send one turn and open its event stream.
    pub async fn send_message(&self, request: SendRequest) -> Result<EventStream> {
        let SendRequest {
            thread_id,
            message,
            attachment,
        } = request;

        let mut form = reqwest::multipart::Form::new()
            .text("threadId", thread_id)
            .text("message", message);
        if let Some(file) = attachment {
            let part = reqwest::multipart::Part::bytes(file.data)
                .file_name(file.filename)
                .mime_str(&file.media_type)?;
            form = form.part("file", part);
        }

        let url = format!("{}/messages", self.base_url);
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
            });
        }

        Ok(Box::pin(read_events(response)))
    }
}

#[derive(Debug, Deserialize)]
struct CreateThreadResponse {
    #[serde(rename = "threadId", default)]
    thread_id: Option<String>,
}

/// Adapt a streamed response body into parsed events.
///
/// The stream ends after the first terminal event. A read failure is logged
/// as a transport failure and surfaced as a single in-band `Error` event, so
/// consumers handle exactly one shape. A body that closes without a terminal
/// frame simply ends; the caller treats connection close as the fallback
/// terminator.
fn read_events(response: reqwest::Response) -> impl futures::Stream<Item = StreamEvent> {
    stream! {
        let mut parser = EventFrameParser::new();
        let mut body = response.bytes_stream();

        while let Some(next) = body.next().await {
            let chunk = match next {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::error!(error = %e, "transport failure while reading stream");
                    yield StreamEvent::Error {
                        error: "the connection to the assistant was interrupted".to_string(),
                    };
                    return;
                }
            };

            for event in parser.feed(&chunk) {
                let terminal = event.is_terminal();
                yield event;
                if terminal {
                    return;
                }
            }
        }

        parser.finish();
    }
}
