//! Capability-scoped tool dispatch.
//!
//! [`ScopedToolRegistry`] is the facade through which the execution engine
//! reaches the tool executor: every dispatch is checked against the
//! recipe's `allowed_tools` whitelist and against the executor's available
//! set before it runs, and results are coerced to the textual form the
//! variable bag stores.

use crate::ports::tool_executor::ToolExecutorPort;
use maestro_domain::tool::entities::ToolCall;
use maestro_domain::tool::value_objects::ToolError;
use thiserror::Error;
use tracing::debug;

/// Errors produced by scoped tool dispatch
#[derive(Error, Debug)]
pub enum ToolDispatchError {
    #[error("Tool '{tool}' is not permitted by this recipe (allowed: {})", .allowed.join(", "))]
    NotAllowed { tool: String, allowed: Vec<String> },

    #[error("Unknown tool '{tool}' (available: {})", .available.join(", "))]
    UnknownTool { tool: String, available: Vec<String> },

    #[error("Tool '{tool}' failed: {error}")]
    Failed {
        tool: String,
        #[source]
        error: ToolError,
    },
}

impl ToolDispatchError {
    /// Whether the failure originated inside the tool layer itself.
    /// Only these faults are classified transient for retry purposes.
    pub fn is_internal(&self) -> bool {
        matches!(self, ToolDispatchError::Failed { error, .. } if error.is_internal())
    }
}

/// Tool dispatch scoped to one recipe's capability set.
///
/// Borrows the shared executor and the recipe's allow-list for the
/// duration of a single run. An empty allow-list means unrestricted.
pub struct ScopedToolRegistry<'a> {
    executor: &'a dyn ToolExecutorPort,
    allowed: &'a [String],
}

impl<'a> ScopedToolRegistry<'a> {
    pub fn new(executor: &'a dyn ToolExecutorPort, allowed: &'a [String]) -> Self {
        Self { executor, allowed }
    }

    /// Dispatch `call`, returning the tool's textual output.
    ///
    /// `Ok(None)` means the tool succeeded without producing output; the
    /// caller coerces that to the empty string.
    pub async fn invoke(&self, call: &ToolCall) -> Result<Option<String>, ToolDispatchError> {
        if !self.allowed.is_empty() && !self.allowed.iter().any(|t| t == &call.tool_name) {
            return Err(ToolDispatchError::NotAllowed {
                tool: call.tool_name.clone(),
                allowed: self.allowed.to_vec(),
            });
        }

        if !self.executor.has_tool(&call.tool_name) {
            return Err(ToolDispatchError::UnknownTool {
                tool: call.tool_name.clone(),
                available: self
                    .executor
                    .available_tools()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            });
        }

        debug!(tool = %call.tool_name, "Dispatching tool call");
        let result = self.executor.execute(call).await;

        if result.is_success() {
            Ok(result.output)
        } else {
            // A failure with no error attached is a fault in the tool
            // layer itself, not in the operation it ran.
            let error = result
                .error
                .unwrap_or_else(|| ToolError::internal("tool reported failure without an error"));
            Err(ToolDispatchError::Failed {
                tool: call.tool_name.clone(),
                error,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use maestro_domain::tool::entities::{ToolDefinition, ToolSpec};
    use maestro_domain::tool::value_objects::ToolResult;

    struct FixedExecutor {
        spec: ToolSpec,
        result: fn(&ToolCall) -> ToolResult,
    }

    impl FixedExecutor {
        fn new(result: fn(&ToolCall) -> ToolResult) -> Self {
            Self {
                spec: ToolSpec::new()
                    .register(ToolDefinition::new("read_file", "Read a file"))
                    .register(ToolDefinition::new("write_file", "Write a file")),
                result,
            }
        }
    }

    #[async_trait]
    impl ToolExecutorPort for FixedExecutor {
        fn tool_spec(&self) -> &ToolSpec {
            &self.spec
        }

        async fn execute(&self, call: &ToolCall) -> ToolResult {
            (self.result)(call)
        }
    }

    fn unrestricted() -> Vec<String> {
        Vec::new()
    }

    #[tokio::test]
    async fn invoke_returns_output() {
        let executor = FixedExecutor::new(|call| ToolResult::success(&call.tool_name, "data"));
        let allowed = unrestricted();
        let registry = ScopedToolRegistry::new(&executor, &allowed);

        let output = registry.invoke(&ToolCall::new("read_file")).await.unwrap();
        assert_eq!(output.as_deref(), Some("data"));
    }

    #[tokio::test]
    async fn absent_output_is_none() {
        let executor = FixedExecutor::new(|call| ToolResult::empty(&call.tool_name));
        let allowed = unrestricted();
        let registry = ScopedToolRegistry::new(&executor, &allowed);

        let output = registry.invoke(&ToolCall::new("write_file")).await.unwrap();
        assert!(output.is_none());
    }

    #[tokio::test]
    async fn disallowed_tool_lists_allowed_names() {
        let executor = FixedExecutor::new(|call| ToolResult::success(&call.tool_name, ""));
        let allowed = vec!["read_file".to_string()];
        let registry = ScopedToolRegistry::new(&executor, &allowed);

        let err = registry.invoke(&ToolCall::new("write_file")).await.unwrap_err();
        assert!(matches!(err, ToolDispatchError::NotAllowed { .. }));
        assert!(err.to_string().contains("read_file"));
        assert!(err.to_string().contains("write_file"));
    }

    #[tokio::test]
    async fn unknown_tool_lists_available_names() {
        let executor = FixedExecutor::new(|call| ToolResult::success(&call.tool_name, ""));
        let allowed = unrestricted();
        let registry = ScopedToolRegistry::new(&executor, &allowed);

        let err = registry.invoke(&ToolCall::new("nonexistent")).await.unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ToolDispatchError::UnknownTool { .. }));
        assert!(message.contains("nonexistent"));
        assert!(message.contains("read_file"));
        assert!(message.contains("write_file"));
    }

    #[tokio::test]
    async fn tool_failure_carries_source_error() {
        let executor = FixedExecutor::new(|call| {
            ToolResult::failure(&call.tool_name, ToolError::not_found("missing.txt"))
        });
        let allowed = unrestricted();
        let registry = ScopedToolRegistry::new(&executor, &allowed);

        let err = registry.invoke(&ToolCall::new("read_file")).await.unwrap_err();
        assert!(!err.is_internal());
        assert!(err.to_string().contains("read_file"));
    }

    #[tokio::test]
    async fn internal_fault_is_classified_transient() {
        let executor = FixedExecutor::new(|call| {
            ToolResult::failure(&call.tool_name, ToolError::internal("registry fault"))
        });
        let allowed = unrestricted();
        let registry = ScopedToolRegistry::new(&executor, &allowed);

        let err = registry.invoke(&ToolCall::new("read_file")).await.unwrap_err();
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn allow_list_is_checked_before_existence() {
        // A tool that is neither allowed nor available reports NotAllowed,
        // without leaking the available set.
        let executor = FixedExecutor::new(|call| ToolResult::success(&call.tool_name, ""));
        let allowed = vec!["read_file".to_string()];
        let registry = ScopedToolRegistry::new(&executor, &allowed);

        let err = registry.invoke(&ToolCall::new("nonexistent")).await.unwrap_err();
        assert!(matches!(err, ToolDispatchError::NotAllowed { .. }));
    }
}
