//! File operation tools: read_file, write_file

use maestro_domain::tool::{
    entities::{ToolCall, ToolDefinition, ToolParameter},
    value_objects::{ToolError, ToolResult},
};
use std::fs;
use std::path::Path;

/// Tool name constants
pub const READ_FILE: &str = "read_file";
pub const WRITE_FILE: &str = "write_file";

/// Maximum file size to read (10 MB)
const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

/// Get the tool definition for read_file
pub fn read_file_definition() -> ToolDefinition {
    ToolDefinition::new(READ_FILE, "Read the contents of a file at the specified path")
        .with_parameter(ToolParameter::new("path", "Path to the file to read", true))
        .with_parameter(ToolParameter::new(
            "offset",
            "Line number to start reading from (0-indexed)",
            false,
        ))
        .with_parameter(ToolParameter::new(
            "limit",
            "Maximum number of lines to read",
            false,
        ))
}

/// Get the tool definition for write_file
pub fn write_file_definition() -> ToolDefinition {
    ToolDefinition::new(
        WRITE_FILE,
        "Write content to a file at the specified path. Creates the file if it doesn't exist, or overwrites if it does.",
    )
    .with_parameter(ToolParameter::new("path", "Path to the file to write", true))
    .with_parameter(ToolParameter::new("content", "Content to write to the file", true))
    .with_parameter(ToolParameter::new(
        "create_dirs",
        "Create parent directories if they don't exist",
        false,
    ))
}

/// Execute the read_file tool
pub fn execute_read_file(call: &ToolCall) -> ToolResult {
    let path_str = match call.require_str("path") {
        Ok(p) => p,
        Err(e) => return ToolResult::failure(READ_FILE, ToolError::invalid_argument(e)),
    };

    let path = Path::new(path_str);

    if !path.exists() {
        return ToolResult::failure(READ_FILE, ToolError::not_found(path_str));
    }

    if !path.is_file() {
        return ToolResult::failure(
            READ_FILE,
            ToolError::invalid_argument(format!("'{}' is not a file", path_str)),
        );
    }

    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            return ToolResult::failure(
                READ_FILE,
                ToolError::execution_failed(format!("Failed to get file metadata: {}", e)),
            );
        }
    };

    if metadata.len() > MAX_READ_SIZE {
        return ToolResult::failure(
            READ_FILE,
            ToolError::invalid_argument(format!(
                "File too large ({} bytes). Maximum size is {} bytes",
                metadata.len(),
                MAX_READ_SIZE
            )),
        );
    }

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                return ToolResult::failure(READ_FILE, ToolError::permission_denied(path_str));
            }
            return ToolResult::failure(
                READ_FILE,
                ToolError::execution_failed(format!("Failed to read file: {}", e)),
            );
        }
    };

    // Optional line windowing
    let offset = call.get_i64("offset").unwrap_or(0) as usize;
    let limit = call.get_i64("limit");

    let output = if offset > 0 || limit.is_some() {
        let lines: Vec<&str> = content.lines().collect();
        let total_lines = lines.len();

        if offset >= total_lines {
            String::new()
        } else {
            let end = match limit {
                Some(l) => (offset + l as usize).min(total_lines),
                None => total_lines,
            };
            lines[offset..end].join("\n")
        }
    } else {
        content
    };

    ToolResult::success(READ_FILE, output)
}

/// Execute the write_file tool
pub fn execute_write_file(call: &ToolCall) -> ToolResult {
    let path_str = match call.require_str("path") {
        Ok(p) => p,
        Err(e) => return ToolResult::failure(WRITE_FILE, ToolError::invalid_argument(e)),
    };

    let content = match call.require_str("content") {
        Ok(c) => c,
        Err(e) => return ToolResult::failure(WRITE_FILE, ToolError::invalid_argument(e)),
    };

    let path = Path::new(path_str);

    let create_dirs = call.get_bool("create_dirs").unwrap_or(false);
    if create_dirs
        && let Some(parent) = path.parent()
        && !parent.exists()
        && let Err(e) = fs::create_dir_all(parent)
    {
        return ToolResult::failure(
            WRITE_FILE,
            ToolError::execution_failed(format!("Failed to create parent directories: {}", e)),
        );
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        return ToolResult::failure(
            WRITE_FILE,
            ToolError::not_found(format!(
                "Parent directory does not exist: {}",
                parent.display()
            )),
        );
    }

    let bytes = content.len();
    if let Err(e) = fs::write(path, content) {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            return ToolResult::failure(WRITE_FILE, ToolError::permission_denied(path_str));
        }
        return ToolResult::failure(
            WRITE_FILE,
            ToolError::execution_failed(format!("Failed to write file: {}", e)),
        );
    }

    ToolResult::success(
        WRITE_FILE,
        format!("Successfully wrote {} bytes to {}", bytes, path_str),
    )
}
