//! Recipe store port
//!
//! Defines the interface for loading named recipe definitions from storage.

use async_trait::async_trait;
use maestro_domain::RecipeDefinition;
use thiserror::Error;

/// Errors that can occur while loading a recipe
#[derive(Error, Debug)]
pub enum RecipeStoreError {
    #[error("No recipe named '{name}' found (searched: {})", .searched.join(", "))]
    NotFound { name: String, searched: Vec<String> },

    #[error("Failed to read recipe '{name}': {reason}")]
    Unreadable { name: String, reason: String },

    #[error("Invalid recipe '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

/// Port for loading recipe definitions
///
/// A definition is loaded fresh on every call — the store never caches,
/// so edits to a recipe file take effect on the next run.
#[async_trait]
pub trait RecipeStorePort: Send + Sync {
    /// Load the recipe named `name`.
    async fn load(&self, name: &str) -> Result<RecipeDefinition, RecipeStoreError>;
}
