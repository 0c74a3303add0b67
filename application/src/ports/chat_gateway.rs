//! Chat gateway port
//!
//! Defines the interface for the streaming model exchange.

use async_trait::async_trait;
use maestro_domain::StreamEvent;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during a chat exchange
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("model returned empty output")]
    EmptyOutput,
}

impl GatewayError {
    /// Whether this error is one of the designated transient shapes:
    /// blank reconciled output, or a streaming-layer "received empty
    /// response" failure. Everything else propagates on first occurrence.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::EmptyOutput => true,
            GatewayError::RequestFailed(msg) => {
                msg.to_ascii_lowercase().contains("received empty response")
            }
            GatewayError::ConnectionError(_) => false,
        }
    }
}

/// Gateway for the streaming model exchange
///
/// This port defines how the application layer talks to a model provider.
/// Implementations (adapters) live in the infrastructure layer. One call
/// opens one exchange; the reply arrives as a [`StreamHandle`].
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Send a composed prompt and receive a streaming reply.
    async fn chat(&self, prompt: &str) -> Result<StreamHandle, GatewayError>;
}

/// Handle for receiving streaming events from a chat exchange.
///
/// Wraps an `mpsc::Receiver<StreamEvent>`. The provider may drive the
/// sending side from its own task, so consumption must stay prompt: the
/// per-token callback should do no more than buffering and progress
/// signaling.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Drain the stream, invoking `on_token` for every delta, and
    /// reconcile the final text.
    ///
    /// Two-path reconciliation: the provider's `Completed` value wins if
    /// it is non-blank after trimming; otherwise the accumulated delta
    /// buffer (trimmed) is used. A provider may legitimately return
    /// nothing (end-of-stream signaled via deltas only) or omit trailing
    /// content from the final value. A blank result either way is
    /// [`GatewayError::EmptyOutput`].
    pub async fn collect_with<F>(mut self, mut on_token: F) -> Result<String, GatewayError>
    where
        F: FnMut(&str),
    {
        let mut buffer = String::new();
        let mut completed: Option<String> = None;

        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => {
                    on_token(&chunk);
                    buffer.push_str(&chunk);
                }
                StreamEvent::Completed(text) => {
                    completed = Some(text);
                    break;
                }
                StreamEvent::Error(e) => {
                    return Err(GatewayError::RequestFailed(e));
                }
            }
        }

        let final_text = match completed {
            Some(text) if !text.trim().is_empty() => text.trim().to_string(),
            // Blank or absent final value (channel closed) — fall back to
            // the token buffer.
            _ => buffer.trim().to_string(),
        };

        if final_text.is_empty() {
            return Err(GatewayError::EmptyOutput);
        }
        Ok(final_text)
    }
}
