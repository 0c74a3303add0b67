//! Application configuration file schema

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration loaded from `maestro.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub gateway: GatewayConfig,
    pub recipes: RecipesConfig,
    pub transcript: TranscriptConfig,
}

/// Model gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the local model server.
    pub endpoint: String,
    /// Model name passed to the server.
    pub model: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
        }
    }
}

/// Recipe discovery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipesConfig {
    /// Extra directory searched for recipes, between the project-level
    /// `./recipes` and the user config directory.
    pub dir: Option<PathBuf>,
}

/// Run transcript settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Directory for JSONL run transcripts; unset disables them.
    pub dir: Option<PathBuf>,
}
