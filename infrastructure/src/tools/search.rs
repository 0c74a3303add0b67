//! Search tool: glob_search

use glob::glob;
use maestro_domain::tool::{
    entities::{ToolCall, ToolDefinition, ToolParameter},
    value_objects::{ToolError, ToolResult},
};

/// Tool name constant
pub const GLOB_SEARCH: &str = "glob_search";

/// Maximum number of results to return
const MAX_RESULTS: usize = 1000;

/// Get the tool definition for glob_search
pub fn glob_search_definition() -> ToolDefinition {
    ToolDefinition::new(
        GLOB_SEARCH,
        "Search for files matching a glob pattern (e.g., '**/*.rs', 'src/*.txt')",
    )
    .with_parameter(ToolParameter::new("pattern", "Glob pattern to match files", true))
    .with_parameter(ToolParameter::new(
        "base_dir",
        "Base directory to search from (default: current dir)",
        false,
    ))
    .with_parameter(ToolParameter::new(
        "max_results",
        "Maximum number of results to return (default: 1000)",
        false,
    ))
}

/// Execute the glob_search tool
pub fn execute_glob_search(call: &ToolCall) -> ToolResult {
    let pattern = match call.require_str("pattern") {
        Ok(p) => p,
        Err(e) => return ToolResult::failure(GLOB_SEARCH, ToolError::invalid_argument(e)),
    };

    let base_dir = call.get_str("base_dir").unwrap_or(".");

    let max_results = call
        .get_i64("max_results")
        .map(|n| n as usize)
        .unwrap_or(MAX_RESULTS)
        .min(MAX_RESULTS);

    let full_pattern = if pattern.starts_with('/') || pattern.starts_with("./") {
        pattern.to_string()
    } else {
        format!("{}/{}", base_dir, pattern)
    };

    let entries = match glob(&full_pattern) {
        Ok(paths) => paths,
        Err(e) => {
            return ToolResult::failure(
                GLOB_SEARCH,
                ToolError::invalid_argument(format!("Invalid glob pattern: {}", e)),
            );
        }
    };

    let mut results = Vec::new();
    let mut error_count = 0;

    for entry in entries {
        if results.len() >= max_results {
            break;
        }

        match entry {
            Ok(path) => {
                results.push(path.display().to_string());
            }
            Err(_) => {
                error_count += 1;
            }
        }
    }

    let mut output = results.join("\n");
    if results.len() >= max_results {
        output.push_str(&format!("\n... (limited to {} results)", max_results));
    }
    if error_count > 0 {
        output.push_str(&format!("\n({} paths could not be accessed)", error_count));
    }

    if results.is_empty() {
        output = "No files found matching the pattern".to_string();
    }

    ToolResult::success(GLOB_SEARCH, output)
}
