//! Model gateway adapters

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "ollama")]
pub use ollama::OllamaGateway;

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// One-shot startup hint state.
///
/// Gateways that depend on an external local service take this object in
/// their constructor and emit their setup hint through it at most once for
/// the object's lifetime. The caller decides the scope (typically one per
/// process) instead of the gateway holding module-level state.
#[derive(Debug, Default)]
pub struct StartupNotice {
    shown: AtomicBool,
}

impl StartupNotice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `message` the first time this is called; subsequent calls are
    /// no-ops.
    pub fn note_once(&self, message: &str) {
        if !self.shown.swap(true, Ordering::Relaxed) {
            warn!("{}", message);
        }
    }
}
