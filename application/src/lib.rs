//! Application layer for maestro
//!
//! This crate contains the recipe execution use case, port definitions,
//! the retry policy engine, and capability-scoped tool dispatch.
//! It depends only on the domain layer.

pub mod ports;
pub mod retry;
pub mod scoped_tools;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    chat_gateway::{ChatGateway, GatewayError, StreamHandle},
    progress::{NoProgress, RunProgressNotifier},
    recipe_store::{RecipeStoreError, RecipeStorePort},
    run_logger::{NoRunLogger, RunEvent, RunLogger},
    tool_executor::ToolExecutorPort,
};
pub use retry::RetryPolicy;
pub use scoped_tools::{ScopedToolRegistry, ToolDispatchError};
pub use use_cases::run_recipe::{RunRecipeError, RunRecipeInput, RunRecipeUseCase};
