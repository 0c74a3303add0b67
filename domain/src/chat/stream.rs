//! Streaming events for the chat exchange.
//!
//! [`StreamEvent`] bridges a provider's token stream to the execution
//! engine. The engine buffers every `Delta` and reconciles the buffer with
//! the `Completed` value: a provider may legitimately signal end-of-stream
//! with an empty final text (tokens only) or omit trailing content from it.

/// An event in a streaming chat response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text chunk from the model.
    Delta(String),
    /// The provider's final return value (signals stream end). May be
    /// blank when the full text was already delivered as deltas.
    Completed(String),
    /// An error that occurred during streaming.
    Error(String),
}

impl StreamEvent {
    /// Returns the text content if this is a Delta or Completed event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) | StreamEvent::Completed(s) => Some(s),
            StreamEvent::Error(_) => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed(_) | StreamEvent::Error(_))
    }
}
