//! Infrastructure layer for maestro
//!
//! This crate contains the concrete adapters behind the application-layer
//! ports: the TOML recipe store, the local tool executor, model gateway
//! adapters, the JSONL run transcript logger, and configuration loading.

pub mod config;
pub mod gateway;
pub mod logging;
pub mod recipes;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig};
pub use gateway::StartupNotice;
#[cfg(feature = "ollama")]
pub use gateway::ollama::OllamaGateway;
pub use logging::JsonlRunLogger;
pub use recipes::FileRecipeStore;
pub use tools::{LocalToolExecutor, default_tool_spec};
