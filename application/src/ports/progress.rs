//! Progress notification port
//!
//! Defines the interface for reporting progress during recipe execution.
//! Implementations live in the presentation layer and can display progress
//! in various ways (console spinner, plain text, none).

/// Callback for progress updates during recipe execution.
///
/// All methods have no-op defaults so implementations only override what
/// they display. `on_token` may be driven from the provider's streaming
/// task — keep it cheap.
pub trait RunProgressNotifier: Send + Sync {
    /// Called once the recipe definition has been loaded.
    fn on_recipe_start(&self, _name: &str, _total_vars: usize) {}

    /// Called after a variable has been resolved through a tool.
    fn on_var_resolved(&self, _name: &str, _preview: &str) {}

    /// Called when the model exchange begins.
    fn on_stream_start(&self) {}

    /// Called for each streamed token.
    fn on_token(&self, _chunk: &str) {}

    /// Called when the model exchange ends (also before a retry).
    fn on_stream_end(&self) {}

    /// Called when a stage is about to be retried.
    fn on_retry(&self, _stage: &str, _attempt: u32, _max_attempts: u32, _error: &str) {}

    /// Called for each post-action with whether its condition fired.
    fn on_post_action(&self, _tool: &str, _fired: bool) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl RunProgressNotifier for NoProgress {}
