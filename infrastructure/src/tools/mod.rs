//! Built-in tool implementations
//!
//! The local tool set a recipe can draw its variables from and target with
//! post-actions: file read/write, shell commands, and glob search.

pub mod command;
pub mod executor;
pub mod file;
pub mod search;

pub use executor::LocalToolExecutor;

use maestro_domain::tool::entities::ToolSpec;

/// The default specification covering every built-in tool.
pub fn default_tool_spec() -> ToolSpec {
    ToolSpec::new()
        .register(file::read_file_definition())
        .register(file::write_file_definition())
        .register(command::run_command_definition())
        .register(search::glob_search_definition())
}
