//! Local tool executor — the concrete implementation of [`ToolExecutorPort`].
//!
//! [`LocalToolExecutor`] bridges the application layer's abstract tool port
//! with actual system operations: file I/O, process execution, and file
//! search. All built-in tools are synchronous; the async `execute` simply
//! routes by canonical name.

use async_trait::async_trait;
use maestro_application::ports::tool_executor::ToolExecutorPort;
use maestro_domain::tool::{
    entities::{ToolCall, ToolSpec},
    value_objects::{ToolError, ToolResult},
};

use super::{command, file, search};

/// Executor that runs tools on the local machine.
///
/// Implements [`ToolExecutorPort`] from the application layer. Recipes
/// restrict which of these tools may run via their allow-list; the
/// executor itself offers the full set.
#[derive(Debug, Clone)]
pub struct LocalToolExecutor {
    /// Available tools
    tool_spec: ToolSpec,
    /// Working directory for commands (None = current directory)
    working_dir: Option<String>,
}

impl LocalToolExecutor {
    /// Create a new executor with all built-in tools.
    pub fn new() -> Self {
        Self {
            tool_spec: super::default_tool_spec(),
            working_dir: None,
        }
    }

    /// Create an executor with a custom tool spec
    pub fn with_tools(tool_spec: ToolSpec) -> Self {
        Self {
            tool_spec,
            working_dir: None,
        }
    }

    /// Set the working directory for commands
    pub fn with_working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Route a call to its built-in tool by canonical name.
    fn execute_internal(&self, call: &ToolCall) -> ToolResult {
        if self.tool_spec.get(&call.tool_name).is_none() {
            return ToolResult::failure(
                &call.tool_name,
                ToolError::not_found(format!("Unknown tool: {}", call.tool_name)),
            );
        }

        match call.tool_name.as_str() {
            file::READ_FILE => file::execute_read_file(call),
            file::WRITE_FILE => file::execute_write_file(call),
            command::RUN_COMMAND => {
                // Inject working directory if set and not already specified
                if let Some(dir) = &self.working_dir
                    && call.get_str("working_dir").is_none()
                {
                    let modified_call = call.clone().with_arg("working_dir", dir.as_str());
                    command::execute_run_command(&modified_call)
                } else {
                    command::execute_run_command(call)
                }
            }
            search::GLOB_SEARCH => search::execute_glob_search(call),
            _ => ToolResult::failure(
                &call.tool_name,
                ToolError::internal(format!(
                    "Tool '{}' is registered but has no implementation",
                    call.tool_name
                )),
            ),
        }
    }
}

impl Default for LocalToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutorPort for LocalToolExecutor {
    fn tool_spec(&self) -> &ToolSpec {
        &self.tool_spec
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        self.execute_internal(call)
    }
}
